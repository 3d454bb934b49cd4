//! I2C master bus emulated over the BLE expander GATT service.
//!
//! Each bus operation becomes one control frame written to the expander's
//! data bundle characteristic, followed in the same gateway batch by a read of
//! its result code. Operations that return data read the MISO characteristic
//! in a second round trip.
//!
//! The device lock is cooperative and lives on the device. Operations set it
//! inside their frames; releasing it is up to the caller, normally through a
//! [`BusSession`].

pub mod bus;
pub mod config;
pub mod endpoints;
pub mod error;
#[cfg(feature = "embedded-hal")]
pub mod hal;
pub mod message;
pub mod session;

#[cfg(test)]
mod testing;

pub use bus::Expander;
pub use config::ExpanderConfig;
pub use endpoints::{DATA_BUNDLE_UUID, MISO_UUID, RESULT_UUID, SERVICE_UUID};
pub use error::{ExpanderError, Result};
pub use gattbus_frame::{BusCommand, ControlFrame, LockType, ResultCode};
pub use message::I2cMessage;
pub use session::BusSession;
