//! Control frames for the BLE I2C expander.
//!
//! The expander accepts one bit-packed control frame per bus transaction:
//! - A 1-byte presence bitmap saying which fields the firmware should act on
//! - Lock, power, chip-select, command and address fields, one byte each
//! - Little-endian 16-bit read and write sizes
//! - The MOSI payload, appended verbatim after the 16-byte header
//!
//! After each frame the firmware publishes a signed result code, decoded by
//! [`ResultCode`]. Frames are write-only: the device answers with raw,
//! caller-sized MISO bytes, so there is no frame decoder.

pub mod codec;
pub mod command;
pub mod error;
pub mod result;

pub use codec::{encode_frame, size_field, ControlFrame, HEADER_SIZE, MAX_TRANSFER_SIZE};
pub use command::{command_name, BusCommand, LockType};
pub use error::{FrameError, Result};
pub use result::{ResultCode, MAX_RESULT_LEN};
