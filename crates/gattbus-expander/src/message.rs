/// One step of an [`i2c_transaction`](crate::Expander::i2c_transaction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I2cMessage {
    /// Write `buf` to the device at `address`.
    Write { address: u8, buf: Vec<u8> },
    /// Read `size` bytes from the device at `address` into `buf`.
    Read {
        address: u8,
        size: usize,
        buf: Vec<u8>,
    },
}

impl I2cMessage {
    pub fn write(address: u8, buf: impl Into<Vec<u8>>) -> Self {
        I2cMessage::Write {
            address,
            buf: buf.into(),
        }
    }

    pub fn read(address: u8, size: usize) -> Self {
        I2cMessage::Read {
            address,
            size,
            buf: Vec::new(),
        }
    }

    pub fn address(&self) -> u8 {
        match self {
            I2cMessage::Write { address, .. } | I2cMessage::Read { address, .. } => *address,
        }
    }

    /// Bytes written, or bytes read once the message has executed.
    pub fn data(&self) -> &[u8] {
        match self {
            I2cMessage::Write { buf, .. } | I2cMessage::Read { buf, .. } => buf,
        }
    }
}
