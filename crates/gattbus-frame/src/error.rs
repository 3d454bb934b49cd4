/// Errors that can occur while building control frames or reading result slots.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A size does not fit the frame's 16-bit size field.
    #[error("{field} of {size} bytes does not fit the frame (max {max})")]
    SizeOutOfRange {
        field: &'static str,
        size: usize,
        max: usize,
    },

    /// The result slot is wider than an `i64`.
    #[error("result slot holds {len} bytes (expected at most 8)")]
    InvalidResult { len: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
