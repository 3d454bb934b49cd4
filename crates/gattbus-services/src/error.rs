use gattbus_gateway::TransportError;

/// Errors that can occur in peripheral services.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The gateway could not execute the request.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A service was asked to act on an empty peripheral list.
    #[error("no peripherals given")]
    NoPeripherals,

    /// A command for one peripheral failed or was not executed.
    #[error("{peripheral}: {characteristic}: {reason}")]
    Command {
        peripheral: String,
        characteristic: String,
        reason: String,
    },

    /// A characteristic value could not be decoded.
    #[error("cannot decode {what} from {len} bytes")]
    InvalidValue { what: &'static str, len: usize },

    /// A scaling multiplier outside `[-10, 10]`.
    #[error("multiplier {0} out of range [-10, 10]")]
    InvalidMultiplier(i32),

    /// A command name that is not recognized.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[cfg(feature = "metrics")]
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

pub type Result<T> = std::result::Result<T, ServiceError>;
