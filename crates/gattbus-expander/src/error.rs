use gattbus_frame::FrameError;
use gattbus_gateway::TransportError;

/// Errors that can occur in expander bus operations.
#[derive(Debug, thiserror::Error)]
pub enum ExpanderError {
    /// The gateway could not execute the request.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A frame could not be built or the result slot could not be read.
    #[error("frame error: {0}")]
    Frame(#[from] FrameError),

    /// The gateway executed a command and reported a failure.
    #[error("command {position} failed on the gateway: {error}")]
    BatchExecution {
        position: usize,
        error: serde_json::Value,
    },

    /// The expander reported a failed result code.
    #[error("command {name} failed (id {command_id})")]
    Protocol { command_id: i64, name: &'static str },

    /// A command whose output is needed was never executed.
    #[error("command {position} was not executed")]
    MissingResponse { position: usize },

    /// The device returned fewer bytes than the caller's buffer needs.
    #[error("short read ({actual} bytes, expected {expected})")]
    ShortRead { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, ExpanderError>;
