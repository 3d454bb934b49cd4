//! Result-slot decoding.
//!
//! After every control frame the firmware publishes a little-endian signed
//! integer that encodes both which command ran and whether it succeeded.
//! Non-negative codes are successes and name the command directly. Negative
//! codes are failures, banded as follows:
//!
//! ```text
//! code < -100        command_id = code + 128
//! -100 <= code < 0   command_id = -code
//! ```
//!
//! Codes below -128 therefore decode to negative ids (-150 gives -22). That
//! is what the firmware convention produces and it is kept as-is.
//!
//! An empty slot reads as code 0. Slots wider than eight bytes do not fit an
//! `i64` and are rejected.

use crate::command::command_name;
use crate::error::{FrameError, Result};

/// Largest result slot that can be decoded.
pub const MAX_RESULT_LEN: usize = 8;

/// A raw result code read back from the expander.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResultCode(i64);

impl ResultCode {
    pub fn new(code: i64) -> Self {
        Self(code)
    }

    /// Read a sign-extended little-endian integer of up to 8 bytes.
    pub fn from_le_bytes(bytes: &[u8]) -> Result<Self> {
        let Some(&last) = bytes.last() else {
            return Ok(Self(0));
        };
        if bytes.len() > MAX_RESULT_LEN {
            return Err(FrameError::InvalidResult { len: bytes.len() });
        }

        let fill = if last & 0x80 != 0 { 0xFF } else { 0x00 };
        let mut buf = [fill; MAX_RESULT_LEN];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(i64::from_le_bytes(buf)))
    }

    pub fn raw(self) -> i64 {
        self.0
    }

    pub fn is_success(self) -> bool {
        self.0 >= 0
    }

    /// The command id multiplexed into this code.
    pub fn command_id(self) -> i64 {
        match self.0 {
            code if code < -100 => code + 128,
            code if code < 0 => -code,
            code => code,
        }
    }

    /// Firmware name of [`command_id`](Self::command_id), or `UNKNOWN`.
    pub fn command_name(self) -> &'static str {
        command_name(self.command_id())
    }
}
