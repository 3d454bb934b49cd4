//! Prometheus gauges for sampled sensor values.

use prometheus::{Encoder, GaugeVec, Opts, Registry, TextEncoder};

use crate::calibration::EnvironmentReading;
use crate::error::{Result, ServiceError};

const LABELS: &[&str] = &["peripheral", "scope"];

/// Sensor gauges labelled by peripheral and sensor scope.
pub struct SensorMetrics {
    registry: Registry,
    humidity: GaugeVec,
    temperature: GaugeVec,
    pressure: GaugeVec,
}

impl SensorMetrics {
    /// Create the gauges in a fresh registry.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let gauge = |name: &str, help: &str| -> Result<GaugeVec> {
            let gauge = GaugeVec::new(Opts::new(name, help), LABELS)?;
            registry.register(Box::new(gauge.clone()))?;
            Ok(gauge)
        };

        let humidity = gauge("sensor_hub_humidity_percent", "Relative humidity")?;
        let temperature = gauge("sensor_hub_temperature_degrees_celsius", "Temperature")?;
        let pressure = gauge("sensor_hub_pressure_pascals", "Pressure")?;

        Ok(Self {
            registry,
            humidity,
            temperature,
            pressure,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_environment(&self, peripheral: &str, scope: &str, reading: &EnvironmentReading) {
        let labels = [peripheral, scope];
        self.humidity.with_label_values(&labels).set(reading.humidity);
        self.temperature.with_label_values(&labels).set(reading.temperature);
        self.pressure.with_label_values(&labels).set(reading.pressure);
    }

    /// Render every gauge in the text exposition format.
    pub fn render(&self) -> Result<String> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf)
            .map_err(|err| ServiceError::Metrics(prometheus::Error::Msg(err.to_string())))
    }
}
