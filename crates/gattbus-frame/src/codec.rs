use bytes::{BufMut, Bytes, BytesMut};

use crate::command::{BusCommand, LockType};
use crate::error::{FrameError, Result};

/// Fixed header size in front of the MOSI payload.
pub const HEADER_SIZE: usize = 16;

/// Largest value the 16-bit size fields can carry.
pub const MAX_TRANSFER_SIZE: usize = u16::MAX as usize;

const LOCK_SET: u8 = 1 << 7;
const POWER_SET: u8 = 1 << 6;
const CS_SET: u8 = 1 << 5;
const COMMAND_SET: u8 = 1 << 4;
const ADDRESS_SET: u8 = 1 << 3;
const SIZE_READ_SET: u8 = 1 << 2;
const SIZE_WRITE_SET: u8 = 1 << 1;
const MOSI_SET: u8 = 1;

/// One bus transaction request for the expander.
///
/// Optional fields that are `None` are encoded as zero and left out of the
/// presence bitmap; the bitmap is what the firmware acts on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControlFrame {
    pub lock: Option<LockType>,
    pub power: Option<bool>,
    pub power_wait: u8,
    pub cs: Option<u8>,
    pub cs_wait: u8,
    pub command: Option<BusCommand>,
    pub address: Option<u8>,
    pub size_read: u16,
    pub size_write: u16,
    pub mosi: Option<Bytes>,
}

impl ControlFrame {
    /// An empty frame: only the always-present size bits are set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(mut self, lock: LockType) -> Self {
        self.lock = Some(lock);
        self
    }

    pub fn power(mut self, on: bool) -> Self {
        self.power = Some(on);
        self
    }

    pub fn power_wait(mut self, wait: u8) -> Self {
        self.power_wait = wait;
        self
    }

    pub fn cs(mut self, cs: u8) -> Self {
        self.cs = Some(cs);
        self
    }

    pub fn cs_wait(mut self, wait: u8) -> Self {
        self.cs_wait = wait;
        self
    }

    pub fn command(mut self, command: BusCommand) -> Self {
        self.command = Some(command);
        self
    }

    pub fn address(mut self, address: u8) -> Self {
        self.address = Some(address);
        self
    }

    pub fn size_read(mut self, size: u16) -> Self {
        self.size_read = size;
        self
    }

    pub fn size_write(mut self, size: u16) -> Self {
        self.size_write = size;
        self
    }

    /// Attach a MOSI payload. An empty payload still counts as present.
    pub fn mosi(mut self, mosi: impl Into<Bytes>) -> Self {
        self.mosi = Some(mosi.into());
        self
    }

    /// Attach a MOSI payload and set `size_write` to its length.
    pub fn write_payload(self, payload: impl Into<Bytes>) -> Result<Self> {
        let payload = payload.into();
        let size = size_field("write payload", payload.len())?;
        Ok(self.size_write(size).mosi(payload))
    }

    /// Set `size_read` from a byte count.
    pub fn read_len(self, len: usize) -> Result<Self> {
        let size = size_field("read size", len)?;
        Ok(self.size_read(size))
    }

    /// The presence bitmap stored in byte 0.
    pub fn presence(&self) -> u8 {
        let mut bits = SIZE_READ_SET | SIZE_WRITE_SET;
        if self.lock.is_some() {
            bits |= LOCK_SET;
        }
        if self.power.is_some() {
            bits |= POWER_SET;
        }
        if self.cs.is_some() {
            bits |= CS_SET;
        }
        if self.command.is_some() {
            bits |= COMMAND_SET;
        }
        if self.address.is_some() {
            bits |= ADDRESS_SET;
        }
        if self.mosi.is_some() {
            bits |= MOSI_SET;
        }
        bits
    }

    /// The total wire size of this frame (header + MOSI).
    pub fn wire_size(&self) -> usize {
        HEADER_SIZE + self.mosi.as_ref().map_or(0, Bytes::len)
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Bytes {
        let mut dst = BytesMut::with_capacity(self.wire_size());
        encode_frame(self, &mut dst);
        dst.freeze()
    }
}

/// Encode a control frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────┬──────────┬──────┬───────┬────────────┬────┬─────────┬─────────┬─────────┐
/// │ presence │ reserved │ lock │ power │ power_wait │ cs │ cs_wait │ command │ address │
/// │ [0]      │ [1]      │ [2]  │ [3]   │ [4]        │[5] │ [6]     │ [7]     │ [8]     │
/// ├──────────┴──────────┴──────┴───────┴────────────┴────┴─────────┴─────────┴─────────┤
/// │ size_read (2B LE) [9..11] │ size_write (2B LE) [11..13] │ reserved [13..16]          │
/// ├────────────────────────────────────────────────────────────────────────────────────┤
/// │ MOSI payload [16..]                                                                │
/// └────────────────────────────────────────────────────────────────────────────────────┘
/// ```
/// Presence bits, most significant first: lock, power, cs, command, address,
/// size_read (always), size_write (always), mosi.
pub fn encode_frame(frame: &ControlFrame, dst: &mut BytesMut) {
    dst.reserve(frame.wire_size());
    dst.put_u8(frame.presence());
    dst.put_u8(0);
    dst.put_u8(frame.lock.map_or(0, LockType::code));
    dst.put_u8(u8::from(frame.power.unwrap_or(false)));
    dst.put_u8(frame.power_wait);
    dst.put_u8(frame.cs.unwrap_or(0));
    dst.put_u8(frame.cs_wait);
    dst.put_u8(frame.command.map_or(0, BusCommand::code));
    dst.put_u8(frame.address.unwrap_or(0));
    dst.put_u16_le(frame.size_read);
    dst.put_u16_le(frame.size_write);
    dst.put_bytes(0, 3);
    if let Some(mosi) = &frame.mosi {
        dst.put_slice(mosi);
    }
}

/// Convert a byte count into a 16-bit size field.
pub fn size_field(field: &'static str, len: usize) -> Result<u16> {
    u16::try_from(len).map_err(|_| FrameError::SizeOutOfRange {
        field,
        size: len,
        max: MAX_TRANSFER_SIZE,
    })
}
