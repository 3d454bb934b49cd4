//! Peripheral services built directly on gateway IO requests.
//!
//! - [`timeouts`]: notification timeouts of the sensor-hub GATT services.
//! - [`calibration`]: BME280 readings and offset calibration.
//! - [`switchbot`]: SwitchBot bot and curtain commands.
//! - [`metrics`] (feature `metrics`): Prometheus gauges for sampled values.

pub mod calibration;
pub mod error;
mod exchange;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod switchbot;
pub mod timeouts;
pub mod units;

#[cfg(test)]
mod testing;

pub use calibration::{
    Bme280Calibrator, CalibrationReport, CalibrationTarget, EnvironmentReading, Offsets,
    PeripheralReading,
};
pub use error::{Result, ServiceError};
#[cfg(feature = "metrics")]
pub use metrics::SensorMetrics;
pub use switchbot::{SwitchBot, SwitchBotCommand};
pub use timeouts::{ServiceType, TimeoutOutcome, TimeoutSetter};
