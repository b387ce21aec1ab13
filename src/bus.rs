use embedded_hal::i2c as hal_i2c;

use crate::Modes;

/// Identifies an outstanding register read.
///
/// The transport hands this back unchanged when the read completes, either by returning
/// [`ReadStatus::Complete`] or later through [`Expander::complete_read()`][complete].  It carries
/// everything needed to route the result: the flat pin index and where that pin lives.
///
/// [complete]: crate::Expander::complete_read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest {
    pub pin: u8,
    pub port: u8,
    pub bit: u8,
}

/// Whether a submitted read already filled the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// The buffer holds the register contents.
    Complete,
    /// The result will be delivered later via `Expander::complete_read()`.
    Pending,
}

/// Raw I2C primitives of the host transport (for example a Firmata board link).
///
/// The transport is expected to execute operations on one bus in submission order.  Timeouts and
/// retries are its business, not the expander's.
pub trait Transport {
    type Error;

    /// Mode and level constants of this transport.  Queried once per initialization.
    fn modes(&self) -> Modes {
        Modes::FIRMATA
    }

    /// Enable I2C on the host side.
    fn configure(&mut self) -> Result<(), Self::Error>;

    /// Write `bytes` (register address followed by data) to the device at `address`.
    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Read `buf.len()` bytes starting at `register`.
    fn read(
        &mut self,
        address: u8,
        register: u8,
        buf: &mut [u8],
        request: ReadRequest,
    ) -> Result<ReadStatus, Self::Error>;
}

pub(crate) trait TransportExt {
    type Error;

    fn write_reg(&mut self, addr: u8, reg: u8, value: u8) -> Result<(), Self::Error>;
}

impl<T: Transport> TransportExt for T {
    type Error = T::Error;

    fn write_reg(&mut self, addr: u8, reg: u8, value: u8) -> Result<(), Self::Error> {
        log::trace!("i2c {:#04x}: write reg {:#04x} = {:#010b}", addr, reg, value);
        self.write(addr, &[reg, value])
    }
}

/// [`Transport`] over a blocking `embedded-hal` I2C bus.
///
/// Reads complete synchronously, so listeners fire before `digital_read()` returns.
pub struct HalTransport<I2C>(I2C);

impl<I2C: hal_i2c::I2c> HalTransport<I2C> {
    pub fn new(i2c: I2C) -> Self {
        Self(i2c)
    }

    pub fn release(self) -> I2C {
        self.0
    }
}

impl<I2C: hal_i2c::I2c> Transport for HalTransport<I2C> {
    type Error = I2C::Error;

    fn configure(&mut self) -> Result<(), Self::Error> {
        // The bus is set up by whoever constructed `I2C`.
        Ok(())
    }

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        self.0.write(address, bytes)
    }

    fn read(
        &mut self,
        address: u8,
        register: u8,
        buf: &mut [u8],
        _request: ReadRequest,
    ) -> Result<ReadStatus, Self::Error> {
        self.0.write_read(address, &[register], buf)?;
        Ok(ReadStatus::Complete)
    }
}
