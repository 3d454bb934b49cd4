use gattbus_gateway::{BatchResponse, CommandResponse, IoGateway, IoRequest, IoResponse};
use tracing::debug;

use crate::error::{Result, ServiceError};

/// Execute `request` and verify the response mirrors its shape.
pub(crate) fn execute<G: IoGateway>(
    gateway: &G,
    adapter_id: &str,
    request: &IoRequest,
) -> Result<IoResponse> {
    debug!(
        adapter = adapter_id,
        batches = request.batches.len(),
        commands = request.command_count(),
        "service request"
    );
    let response = gateway.execute(adapter_id, request)?;
    response.check_shape(request)?;
    Ok(response)
}

/// The value returned by the command at `position`, or a per-peripheral error.
pub(crate) fn command_value<'a>(
    batch: &'a BatchResponse,
    position: usize,
    peripheral: &str,
    characteristic: &str,
) -> Result<&'a [u8]> {
    match batch.command_responses.get(position).and_then(Option::as_ref) {
        Some(CommandResponse::Ok(value)) => Ok(value),
        Some(CommandResponse::Error(err)) => Err(command_error(peripheral, characteristic, err)),
        None => Err(ServiceError::Command {
            peripheral: peripheral.to_string(),
            characteristic: characteristic.to_string(),
            reason: "not executed".to_string(),
        }),
    }
}

pub(crate) fn command_error(
    peripheral: &str,
    characteristic: &str,
    err: &serde_json::Value,
) -> ServiceError {
    ServiceError::Command {
        peripheral: peripheral.to_string(),
        characteristic: characteristic.to_string(),
        reason: error_reason(err),
    }
}

/// Gateway errors are usually plain strings; anything else is shown as JSON.
pub(crate) fn error_reason(err: &serde_json::Value) -> String {
    match err {
        serde_json::Value::String(message) => message.clone(),
        other => other.to_string(),
    }
}
