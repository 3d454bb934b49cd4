/// Errors that can occur while talking to the BLE gateway.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The gateway answered with a non-success status.
    #[error("gateway returned status {status}: {}", body.as_deref().unwrap_or("<empty body>"))]
    Status { status: u16, body: Option<String> },

    /// The gateway could not be reached at all.
    #[error("gateway unreachable at {url}: {message}")]
    Unreachable { url: String, message: String },

    /// An I/O error occurred while reading the gateway response body.
    #[error("gateway I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The request could not be serialized or the response could not be parsed.
    #[error("gateway json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The response does not mirror the request batch count.
    #[error("response has {actual} batches, request had {expected}")]
    BatchCountMismatch { expected: usize, actual: usize },

    /// A batch response does not mirror the command count of its batch.
    #[error("batch {batch} has {actual} command responses, request had {expected}")]
    CommandCountMismatch {
        batch: usize,
        expected: usize,
        actual: usize,
    },
}

impl TransportError {
    /// HTTP status reported by the gateway, if the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
