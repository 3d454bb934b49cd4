use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::adapter::{Adapter, AdapterInfo};
use crate::error::{Result, TransportError};
use crate::model::{IoRequest, IoResponse};
use crate::traits::IoGateway;

/// Default gateway address when none is configured.
pub const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:8000";

/// Configuration for the HTTP gateway client.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the gateway, without a trailing path.
    pub base_url: String,
    /// Overall timeout for one HTTP exchange.
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Blocking HTTP client for the BLE gateway REST API.
pub struct HttpGateway {
    agent: ureq::Agent,
    config: GatewayConfig,
}

/// Every gateway payload is wrapped in `{"data": ...}`.
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

impl HttpGateway {
    /// Create a client for `base_url` with default settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_config(GatewayConfig {
            base_url: base_url.into(),
            ..GatewayConfig::default()
        })
    }

    /// Create a client with explicit configuration.
    pub fn with_config(config: GatewayConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Self { agent, config }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// List the adapters the gateway owns.
    pub fn list_adapters(&self) -> Result<Vec<AdapterInfo>> {
        self.get_data("/ble/adapters")
    }

    /// Describe every adapter with its discovered peripherals and services.
    pub fn describe_adapters(&self) -> Result<Vec<Adapter>> {
        self.get_data("/ble/adapters/describe")
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn get_data<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        debug!(%url, "gateway request");
        let response = self.agent.get(&url).call();
        read_data(&url, response)
    }
}

impl IoGateway for HttpGateway {
    fn execute(&self, adapter_id: &str, request: &IoRequest) -> Result<IoResponse> {
        let url = self.url(&format!("/ble/adapters/{adapter_id}/io"));
        let body = serde_json::to_string(request)?;
        debug!(
            adapter = adapter_id,
            batches = request.batches.len(),
            commands = request.command_count(),
            "gateway io request"
        );

        let response = self
            .agent
            .post(&url)
            .set("Content-Type", "application/json")
            .send_string(&body);
        read_data(&url, response)
    }
}

fn read_data<T: DeserializeOwned>(
    url: &str,
    response: std::result::Result<ureq::Response, ureq::Error>,
) -> Result<T> {
    let response = match response {
        Ok(response) => response,
        Err(ureq::Error::Status(status, response)) => {
            return Err(TransportError::Status {
                status,
                body: read_body(response),
            })
        }
        Err(err) => {
            return Err(TransportError::Unreachable {
                url: url.to_string(),
                message: err.to_string(),
            })
        }
    };

    let status = response.status();
    let body = response.into_string()?;
    // Only a plain 200 carries a data envelope.
    if status != 200 {
        return Err(TransportError::Status {
            status,
            body: Some(body).filter(|b| !b.is_empty()),
        });
    }

    let envelope: Envelope<T> = serde_json::from_str(&body)?;
    Ok(envelope.data)
}

fn read_body(response: ureq::Response) -> Option<String> {
    response.into_string().ok().filter(|body| !body.is_empty())
}
