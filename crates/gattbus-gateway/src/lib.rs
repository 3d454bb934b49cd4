//! Batched peripheral IO against a remote BLE gateway.
//!
//! The gateway owns the radio: scanning, pairing and connections all happen
//! on its side. This crate models what is sent to it and what comes back:
//! - [`model`]: commands, batches, requests and their mirrored responses
//! - [`IoGateway`]: the single blocking `execute` call everything builds on
//! - [`HttpGateway`]: the REST client for the gateway's HTTP API
//!
//! This is the lowest layer of gattbus.

pub mod adapter;
pub mod error;
pub mod http;
pub mod model;
pub mod traits;

pub use adapter::{
    AddressType, Adapter, AdapterInfo, CharProp, Characteristic, Descriptor, Peripheral,
    PeripheralProps, Service,
};
pub use error::{Result, TransportError};
pub use http::{GatewayConfig, HttpGateway, DEFAULT_GATEWAY_URL};
pub use model::{
    parallelism, Batch, BatchResponse, Command, CommandResponse, Endpoint, IoRequest, IoResponse,
    ReadCommand, WriteCommand,
};
pub use traits::IoGateway;
