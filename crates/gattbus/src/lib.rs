//! I2C devices and GATT services behind a remote BLE gateway.
//!
//! A BLE gateway owns the radio and executes batched GATT reads and writes on
//! request. gattbus builds on that to drive an I2C expander peripheral as a
//! regular bus master, and to talk to a few sensor-hub services directly.
//!
//! # Crate Structure
//!
//! - [`gateway`]: batched IO model, `IoGateway` trait and the HTTP client
//! - [`frame`]: expander control frames and result codes
//! - [`expander`]: the I2C bus over the expander (behind `expander` feature)
//! - [`services`]: timeouts, BME280 calibration, SwitchBot (behind `services` feature)

/// Re-export gateway types.
pub mod gateway {
    pub use gattbus_gateway::*;
}

/// Re-export frame types.
pub mod frame {
    pub use gattbus_frame::*;
}

/// Re-export expander bus types (requires `expander` feature).
#[cfg(feature = "expander")]
pub mod expander {
    pub use gattbus_expander::*;
}

/// Re-export service types (requires `services` feature).
#[cfg(feature = "services")]
pub mod services {
    pub use gattbus_services::*;
}
