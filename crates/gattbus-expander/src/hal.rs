//! `embedded-hal` I2C bridge, so existing sensor drivers can run over the expander.

use embedded_hal::i2c::{self, ErrorKind, ErrorType, I2c, Operation, SevenBitAddress};
use gattbus_gateway::IoGateway;

use crate::bus::Expander;
use crate::error::ExpanderError;

impl i2c::Error for ExpanderError {
    fn kind(&self) -> ErrorKind {
        match self {
            ExpanderError::Protocol { .. } => ErrorKind::Bus,
            _ => ErrorKind::Other,
        }
    }
}

impl<G: IoGateway> ErrorType for Expander<G> {
    type Error = ExpanderError;
}

impl<G: IoGateway> I2c<SevenBitAddress> for Expander<G> {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        for operation in operations {
            match operation {
                Operation::Write(bytes) => Expander::write(&*self, address, bytes)?,
                Operation::Read(buf) => {
                    let data = Expander::read(&*self, address, buf.len())?;
                    fill(buf, &data)?;
                }
            }
        }
        Ok(())
    }

    fn write_read(
        &mut self,
        address: SevenBitAddress,
        write: &[u8],
        read: &mut [u8],
    ) -> Result<(), Self::Error> {
        let data = Expander::write_read(&*self, address, write, read.len())?;
        fill(read, &data)
    }
}

fn fill(buf: &mut [u8], data: &[u8]) -> Result<(), ExpanderError> {
    let src = data.get(..buf.len()).ok_or(ExpanderError::ShortRead {
        expected: buf.len(),
        actual: data.len(),
    })?;
    buf.copy_from_slice(src);
    Ok(())
}
