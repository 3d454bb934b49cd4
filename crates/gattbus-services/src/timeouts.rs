//! Notification timeouts of the sensor-hub GATT services.

use std::fmt;
use std::time::Duration;

use gattbus_gateway::{Batch, Command, CommandResponse, Endpoint, IoGateway, IoRequest};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Result, ServiceError};
use crate::exchange;

const BATCH_PARALLELISM: u32 = 10;
const MAX_REQUEST_PARALLELISM: usize = 10;

/// Default per-command timeout for timeout writes.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// A sensor-hub service that exposes a notification timeout characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    DeviceInformation,
    Bme280,
    Lis2dh12,
    Adc,
    Veml6040,
}

impl ServiceType {
    pub const ALL: [ServiceType; 5] = [
        ServiceType::DeviceInformation,
        ServiceType::Bme280,
        ServiceType::Lis2dh12,
        ServiceType::Adc,
        ServiceType::Veml6040,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ServiceType::DeviceInformation => "device_information",
            ServiceType::Bme280 => "bme280",
            ServiceType::Lis2dh12 => "lis2dh12",
            ServiceType::Adc => "adc",
            ServiceType::Veml6040 => "veml6040",
        }
    }

    /// Service and characteristic UUIDs of the timeout characteristic.
    pub fn timeout_characteristic(self) -> (&'static str, &'static str) {
        match self {
            ServiceType::DeviceInformation => (
                "0000180a-0000-1000-8000-00805f9b34fb",
                "a0e4d2ba-0002-8000-8789-00805f9b34fb",
            ),
            ServiceType::Bme280 => (
                "5c853275-723b-4754-a329-969d4bc8121e",
                "a0e4a2ba-0000-8000-0000-00805f9b34fb",
            ),
            ServiceType::Lis2dh12 => (
                "5c853275-823b-4754-a329-969d4bc8121e",
                "a0e4a2ba-0000-8000-0000-00805f9b34fb",
            ),
            ServiceType::Adc => (
                "5c853275-723b-4754-a329-969d8bc8121d",
                "a0e4d2ba-0002-8000-0000-00805f9b34fb",
            ),
            ServiceType::Veml6040 => (
                "5c853275-923b-4754-a329-969d4bc8121e",
                "a0e4a2ba-0000-8000-0000-00805f9b34fb",
            ),
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of one timeout write.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeoutOutcome {
    pub peripheral: String,
    pub service: ServiceType,
    /// `None` when the write succeeded.
    pub error: Option<String>,
}

impl TimeoutOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Writes notification timeouts to every known service of a set of peripherals.
pub struct TimeoutSetter<G> {
    gateway: G,
    adapter_id: String,
    command_timeout: Duration,
}

impl<G: IoGateway> TimeoutSetter<G> {
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

    /// One batch per peripheral, one write per service.
    pub fn build_request<S: AsRef<str>>(
        &self,
        peripherals: &[S],
        notification_timeout_ms: u32,
    ) -> IoRequest {
        let value = notification_timeout_ms.to_le_bytes();
        let batches = peripherals.iter().map(|peripheral| {
            Batch::new(ServiceType::ALL.iter().map(|service| {
                let (service_uuid, characteristic_uuid) = service.timeout_characteristic();
                Command::write(
                    Endpoint::new(peripheral.as_ref(), service_uuid, characteristic_uuid),
                    value.to_vec(),
                    true,
                    self.command_timeout,
                )
            }))
            .with_parallelism(BATCH_PARALLELISM)
        });
        let parallelism = peripherals.len().min(MAX_REQUEST_PARALLELISM) as u32;
        IoRequest::new(batches).with_parallelism(parallelism)
    }

    /// Set the notification timeout of every service on every peripheral.
    ///
    /// Failures of individual writes are reported per outcome, not as an error.
    pub fn set_all_timeouts<S: AsRef<str>>(
        &self,
        peripherals: &[S],
        notification_timeout_ms: u32,
    ) -> Result<Vec<TimeoutOutcome>> {
        if peripherals.is_empty() {
            return Err(ServiceError::NoPeripherals);
        }

        let request = self.build_request(peripherals, notification_timeout_ms);
        let response = exchange::execute(&self.gateway, &self.adapter_id, &request)?;

        let mut outcomes = Vec::with_capacity(request.command_count());
        for (peripheral, batch) in peripherals.iter().zip(&response.batch_responses) {
            let peripheral = peripheral.as_ref();
            for (service, result) in ServiceType::ALL.iter().zip(&batch.command_responses) {
                let error = match result {
                    Some(CommandResponse::Ok(_)) => None,
                    Some(CommandResponse::Error(err)) => Some(exchange::error_reason(err)),
                    None => Some("not executed".to_string()),
                };
                if let Some(error) = &error {
                    warn!(peripheral, service = %service, error = %error, "timeout write failed");
                }
                outcomes.push(TimeoutOutcome {
                    peripheral: peripheral.to_string(),
                    service: *service,
                    error,
                });
            }
        }

        info!(
            peripherals = peripherals.len(),
            notification_timeout_ms,
            failed = outcomes.iter().filter(|o| !o.is_ok()).count(),
            "notification timeouts set"
        );
        Ok(outcomes)
    }
}
