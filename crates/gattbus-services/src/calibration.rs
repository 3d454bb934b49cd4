//! BME280 readings and offset calibration.
//!
//! The sensor hub adds a stored offset to each raw reading before exposing it
//! on the environmental sensing characteristics. Calibrating means reading the
//! exposed value and the current offset, then writing the offset that makes
//! the exposed value equal a reference.

use std::time::Duration;

use gattbus_gateway::{Batch, BatchResponse, Command, Endpoint, IoGateway, IoRequest};
use serde::Serialize;
use tracing::info;

use crate::error::{Result, ServiceError};
use crate::exchange;
use crate::units::{decode_f32, decode_humidity, decode_pressure, decode_temperature};

pub const BME280_SERVICE_UUID: &str = "5c853275-723b-4754-a329-969d4bc8121e";
pub const HUMIDITY_UUID: &str = "00002a6f-0000-1000-8000-00805f9b34fb";
pub const TEMPERATURE_UUID: &str = "00002a6e-0000-1000-8000-00805f9b34fb";
pub const PRESSURE_UUID: &str = "00002a6d-0000-1000-8000-00805f9b34fb";
pub const HUMIDITY_OFFSET_UUID: &str = "a0e4a2ba-1234-4321-0001-00805f9b34fb";
pub const TEMPERATURE_OFFSET_UUID: &str = "a0e4a2ba-1234-4321-0002-00805f9b34fb";
pub const PRESSURE_OFFSET_UUID: &str = "a0e4a2ba-1234-4321-0003-00805f9b34fb";

const BATCH_PARALLELISM: u32 = 32;
const REQUEST_PARALLELISM: u32 = 4;

/// Default per-command timeout.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// One set of environmental readings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnvironmentReading {
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Degrees Celsius.
    pub temperature: f64,
    /// Pascals.
    pub pressure: f64,
}

/// Readings for one peripheral.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeripheralReading {
    pub peripheral: String,
    #[serde(flatten)]
    pub reading: EnvironmentReading,
}

/// Stored calibration offsets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Offsets {
    pub humidity: f32,
    pub temperature: f32,
    pub pressure: f32,
}

/// Reference values the calibrated readings should match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationTarget {
    pub humidity: f64,
    pub temperature: f64,
    pub pressure: f64,
}

impl Default for CalibrationTarget {
    fn default() -> Self {
        Self {
            humidity: 72.0,
            temperature: 21.9,
            pressure: 102_400.0,
        }
    }
}

/// What calibration found and wrote for one peripheral.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalibrationReport {
    pub peripheral: String,
    pub current: EnvironmentReading,
    pub current_offsets: Offsets,
    pub next_offsets: Offsets,
}

impl CalibrationReport {
    fn compute(
        peripheral: &str,
        current: EnvironmentReading,
        offsets: Offsets,
        target: &CalibrationTarget,
    ) -> Self {
        let next = |target: f64, current: f64, offset: f32| {
            let raw = current - f64::from(offset);
            (target - raw) as f32
        };
        Self {
            peripheral: peripheral.to_string(),
            current,
            current_offsets: offsets,
            next_offsets: Offsets {
                humidity: next(target.humidity, current.humidity, offsets.humidity),
                temperature: next(target.temperature, current.temperature, offsets.temperature),
                pressure: next(target.pressure, current.pressure, offsets.pressure),
            },
        }
    }
}

/// Reads and calibrates BME280 sensors on a set of peripherals.
pub struct Bme280Calibrator<G> {
    gateway: G,
    adapter_id: String,
    command_timeout: Duration,
}

impl<G: IoGateway> Bme280Calibrator<G> {
    pub fn new(gateway: G, adapter_id: impl Into<String>) -> Self {
        Self {
            gateway,
            adapter_id: adapter_id.into(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    fn endpoint(peripheral: &str, characteristic_uuid: &str) -> Endpoint {
        Endpoint::new(peripheral, BME280_SERVICE_UUID, characteristic_uuid)
    }

    /// Read each characteristic on every peripheral: one batch per characteristic.
    fn read_characteristics<S: AsRef<str>>(
        &self,
        peripherals: &[S],
        characteristics: &[&str],
    ) -> Result<Vec<BatchResponse>> {
        if peripherals.is_empty() {
            return Err(ServiceError::NoPeripherals);
        }

        let request = IoRequest::new(characteristics.iter().map(|characteristic| {
            Batch::new(peripherals.iter().map(|peripheral| {
                Command::read(
                    Self::endpoint(peripheral.as_ref(), characteristic),
                    false,
                    self.command_timeout,
                )
            }))
            .with_parallelism(BATCH_PARALLELISM)
        }))
        .with_parallelism(REQUEST_PARALLELISM);

        let response = exchange::execute(&self.gateway, &self.adapter_id, &request)?;
        Ok(response.batch_responses)
    }

    /// Current humidity, temperature and pressure of every peripheral.
    pub fn read_environment<S: AsRef<str>>(
        &self,
        peripherals: &[S],
    ) -> Result<Vec<PeripheralReading>> {
        let batches = self.read_characteristics(
            peripherals,
            &[HUMIDITY_UUID, TEMPERATURE_UUID, PRESSURE_UUID],
        )?;

        peripherals
            .iter()
            .enumerate()
            .map(|(position, peripheral)| {
                let peripheral = peripheral.as_ref();
                let reading = decode_reading(&batches, position, peripheral)?;
                Ok(PeripheralReading {
                    peripheral: peripheral.to_string(),
                    reading,
                })
            })
            .collect()
    }

    /// Compute and write offsets so every peripheral reports `target`.
    ///
    /// All readings are taken first; nothing is written unless every
    /// peripheral was read successfully.
    pub fn calibrate<S: AsRef<str>>(
        &self,
        peripherals: &[S],
        target: &CalibrationTarget,
    ) -> Result<Vec<CalibrationReport>> {
        let batches = self.read_characteristics(
            peripherals,
            &[
                HUMIDITY_UUID,
                TEMPERATURE_UUID,
                PRESSURE_UUID,
                HUMIDITY_OFFSET_UUID,
                TEMPERATURE_OFFSET_UUID,
                PRESSURE_OFFSET_UUID,
            ],
        )?;

        let mut reports = Vec::with_capacity(peripherals.len());
        for (position, peripheral) in peripherals.iter().enumerate() {
            let peripheral = peripheral.as_ref();
            let current = decode_reading(&batches, position, peripheral)?;
            let offsets = Offsets {
                humidity: decode_offset(&batches[3], position, peripheral, HUMIDITY_OFFSET_UUID)?,
                temperature: decode_offset(
                    &batches[4],
                    position,
                    peripheral,
                    TEMPERATURE_OFFSET_UUID,
                )?,
                pressure: decode_offset(&batches[5], position, peripheral, PRESSURE_OFFSET_UUID)?,
            };

            let report = CalibrationReport::compute(peripheral, current, offsets, target);
            info!(
                peripheral,
                humidity = current.humidity,
                temperature = current.temperature,
                pressure = current.pressure,
                next_humidity_offset = report.next_offsets.humidity,
                next_temperature_offset = report.next_offsets.temperature,
                next_pressure_offset = report.next_offsets.pressure,
                "bme280 calibration"
            );
            reports.push(report);
        }

        self.write_offsets(&reports)?;
        Ok(reports)
    }

    fn write_offsets(&self, reports: &[CalibrationReport]) -> Result<()> {
        let writes: Vec<(&str, &str, f32)> = reports
            .iter()
            .flat_map(|report| {
                let next = report.next_offsets;
                [
                    (report.peripheral.as_str(), HUMIDITY_OFFSET_UUID, next.humidity),
                    (report.peripheral.as_str(), TEMPERATURE_OFFSET_UUID, next.temperature),
                    (report.peripheral.as_str(), PRESSURE_OFFSET_UUID, next.pressure),
                ]
            })
            .collect();

        let request = IoRequest::single(
            Batch::new(writes.iter().map(|&(peripheral, characteristic, value)| {
                Command::write(
                    Self::endpoint(peripheral, characteristic),
                    value.to_le_bytes().to_vec(),
                    true,
                    self.command_timeout,
                )
            }))
            .with_parallelism(BATCH_PARALLELISM),
        )
        .with_parallelism(REQUEST_PARALLELISM);

        let response = exchange::execute(&self.gateway, &self.adapter_id, &request)?;
        let batch = response.batch_responses.first().cloned().unwrap_or_default();
        for (position, &(peripheral, characteristic, _)) in writes.iter().enumerate() {
            exchange::command_value(&batch, position, peripheral, characteristic)?;
        }
        Ok(())
    }
}

fn decode_reading(
    batches: &[BatchResponse],
    position: usize,
    peripheral: &str,
) -> Result<EnvironmentReading> {
    let value = |index: usize, characteristic: &str| {
        exchange::command_value(&batches[index], position, peripheral, characteristic)
    };
    Ok(EnvironmentReading {
        humidity: decode_humidity(value(0, HUMIDITY_UUID)?)?,
        temperature: decode_temperature(value(1, TEMPERATURE_UUID)?)?,
        pressure: decode_pressure(value(2, PRESSURE_UUID)?)?,
    })
}

fn decode_offset(
    batch: &BatchResponse,
    position: usize,
    peripheral: &str,
    characteristic: &str,
) -> Result<f32> {
    decode_f32(exchange::command_value(batch, position, peripheral, characteristic)?)
}
