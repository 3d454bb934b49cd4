//! Batched peripheral IO request/response model.
//!
//! A request is an ordered list of batches, each an ordered list of commands.
//! The gateway answers with the same shape: one batch response per batch and
//! one (possibly absent) command response per command, in submission order.
//! `parallelism` is an advisory upper bound for the gateway's scheduler and
//! says nothing about the order in which results are reported.

use std::num::NonZeroU32;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TransportError};

/// One GATT characteristic on one peripheral.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub peripheral_address: String,
    pub service_uuid: String,
    pub characteristic_uuid: String,
}

impl Endpoint {
    pub fn new(
        peripheral_address: impl Into<String>,
        service_uuid: impl Into<String>,
        characteristic_uuid: impl Into<String>,
    ) -> Self {
        Self {
            peripheral_address: peripheral_address.into(),
            service_uuid: service_uuid.into(),
            characteristic_uuid: characteristic_uuid.into(),
        }
    }
}

/// Write `value` to a characteristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteCommand {
    #[serde(rename = "fqcn")]
    pub endpoint: Endpoint,
    pub value: Vec<u8>,
    /// Use a write-with-response GATT operation.
    pub wait_response: bool,
    pub timeout_ms: u64,
}

/// Read a characteristic, optionally waiting for the next notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadCommand {
    #[serde(rename = "fqcn")]
    pub endpoint: Endpoint,
    pub wait_notification: bool,
    pub timeout_ms: u64,
}

/// A single IO command executed by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Write(WriteCommand),
    Read(ReadCommand),
}

impl Command {
    /// Create a write command.
    pub fn write(
        endpoint: Endpoint,
        value: impl Into<Vec<u8>>,
        wait_response: bool,
        timeout: Duration,
    ) -> Self {
        Command::Write(WriteCommand {
            endpoint,
            value: value.into(),
            wait_response,
            timeout_ms: duration_to_millis(timeout),
        })
    }

    /// Create a read command.
    pub fn read(endpoint: Endpoint, wait_notification: bool, timeout: Duration) -> Self {
        Command::Read(ReadCommand {
            endpoint,
            wait_notification,
            timeout_ms: duration_to_millis(timeout),
        })
    }

    /// The characteristic this command targets.
    pub fn endpoint(&self) -> &Endpoint {
        match self {
            Command::Write(cmd) => &cmd.endpoint,
            Command::Read(cmd) => &cmd.endpoint,
        }
    }

    /// Per-command timeout enforced by the gateway.
    pub fn timeout(&self) -> Duration {
        match self {
            Command::Write(cmd) => Duration::from_millis(cmd.timeout_ms),
            Command::Read(cmd) => Duration::from_millis(cmd.timeout_ms),
        }
    }
}

fn duration_to_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}

/// Build a parallelism hint, treating zero as one.
pub fn parallelism(hint: u32) -> NonZeroU32 {
    NonZeroU32::new(hint).unwrap_or(NonZeroU32::MIN)
}

/// An ordered group of commands submitted together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub commands: Vec<Command>,
    pub parallelism: NonZeroU32,
}

impl Batch {
    /// Create a batch with a parallelism hint of one.
    pub fn new(commands: impl IntoIterator<Item = Command>) -> Self {
        Self {
            commands: commands.into_iter().collect(),
            parallelism: NonZeroU32::MIN,
        }
    }

    pub fn with_parallelism(mut self, hint: u32) -> Self {
        self.parallelism = parallelism(hint);
        self
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// A full IO request for one adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoRequest {
    pub batches: Vec<Batch>,
    pub parallelism: NonZeroU32,
}

impl IoRequest {
    /// Create a request with a parallelism hint of one.
    pub fn new(batches: impl IntoIterator<Item = Batch>) -> Self {
        Self {
            batches: batches.into_iter().collect(),
            parallelism: NonZeroU32::MIN,
        }
    }

    /// A request holding exactly one batch.
    pub fn single(batch: Batch) -> Self {
        Self::new([batch])
    }

    pub fn with_parallelism(mut self, hint: u32) -> Self {
        self.parallelism = parallelism(hint);
        self
    }

    /// Total number of commands across all batches.
    pub fn command_count(&self) -> usize {
        self.batches.iter().map(Batch::len).sum()
    }
}

/// Outcome of one executed command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CommandResponse {
    /// The command ran; reads carry the characteristic value, writes an empty value.
    Ok(Vec<u8>),
    /// The command ran and failed. The payload is gateway-defined.
    Error(serde_json::Value),
}

impl CommandResponse {
    pub fn as_ok(&self) -> Option<&[u8]> {
        match self {
            CommandResponse::Ok(value) => Some(value),
            CommandResponse::Error(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, CommandResponse::Error(_))
    }
}

/// Responses for one batch. `None` marks a command that was never executed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResponse {
    pub command_responses: Vec<Option<CommandResponse>>,
}

impl BatchResponse {
    /// The response at `position`, if that command was executed.
    pub fn get(&self, position: usize) -> Option<&CommandResponse> {
        self.command_responses.get(position).and_then(Option::as_ref)
    }

    /// The first executed command that failed, with its position.
    pub fn first_error(&self) -> Option<(usize, &serde_json::Value)> {
        self.command_responses
            .iter()
            .enumerate()
            .find_map(|(position, response)| match response {
                Some(CommandResponse::Error(err)) => Some((position, err)),
                _ => None,
            })
    }

    pub fn len(&self) -> usize {
        self.command_responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.command_responses.is_empty()
    }
}

/// Responses for a full request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IoResponse {
    pub batch_responses: Vec<BatchResponse>,
}

impl IoResponse {
    /// Verify that this response mirrors the shape of `request`.
    pub fn check_shape(&self, request: &IoRequest) -> Result<()> {
        if self.batch_responses.len() != request.batches.len() {
            return Err(TransportError::BatchCountMismatch {
                expected: request.batches.len(),
                actual: self.batch_responses.len(),
            });
        }

        for (index, (batch, response)) in request
            .batches
            .iter()
            .zip(&self.batch_responses)
            .enumerate()
        {
            if batch.len() != response.len() {
                return Err(TransportError::CommandCountMismatch {
                    batch: index,
                    expected: batch.len(),
                    actual: response.len(),
                });
            }
        }

        Ok(())
    }

    pub fn batch(&self, index: usize) -> Option<&BatchResponse> {
        self.batch_responses.get(index)
    }
}
