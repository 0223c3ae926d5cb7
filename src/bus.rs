//! Byte-oriented register access over I2C/SMBus.
//!
//! The driver only needs "read N bytes starting at register R" and "write N
//! bytes starting at register R". [`Bus`] captures that, and is implemented
//! for the Linux I2C device of `rppal` and for anything that implements the
//! `embedded-hal` blocking I2C traits (through [`HalBus`]).

use embedded_hal::blocking::i2c as hal_i2c;
use rppal::i2c::{self, I2c};
use std::fmt::Debug;
use thiserror::Error;

/// Attempts made by [`Bus::probe`] before giving up. The chip may NAK the
/// first few address phases after power up.
pub const PROBE_ATTEMPTS: usize = 5;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("device at {address:#04X} did not acknowledge")]
    Nack { address: u8 },
    #[error("short read from register {register:#04X}: expected {expected} bytes, got {got}")]
    ShortRead {
        register: u8,
        expected: usize,
        got: usize,
    },
    #[error("short write to register {register:#04X}: expected {expected} bytes, got {got}")]
    ShortWrite {
        register: u8,
        expected: usize,
        got: usize,
    },
    #[error("I2C error. {source}")]
    I2c {
        #[from]
        source: i2c::Error,
    },
    #[error("I2C error. {0}")]
    Hal(String),
}

pub trait Bus {
    /// A single empty transaction addressed to `address`.
    fn ping(&mut self, address: u8) -> Result<(), BusError>;

    /// Fills `buf` with consecutive registers starting at `register`.
    fn read_bytes(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), BusError>;

    /// Writes `values` to consecutive registers starting at `register`.
    fn write_bytes(&mut self, address: u8, register: u8, values: &[u8]) -> Result<(), BusError>;

    /// Returns true as soon as one of [`PROBE_ATTEMPTS`] pings is acknowledged.
    fn probe(&mut self, address: u8) -> bool {
        for attempt in 1..=PROBE_ATTEMPTS {
            match self.ping(address) {
                Ok(()) => return true,
                Err(e) => debug!("Probe {:#04X} attempt {}: {}", address, attempt, e),
            }
        }
        false
    }

    fn read_byte(&mut self, address: u8, register: u8) -> Result<u8, BusError> {
        let mut buf = [0u8; 1];
        self.read_bytes(address, register, &mut buf)?;
        Ok(buf[0])
    }

    fn write_byte(&mut self, address: u8, register: u8, value: u8) -> Result<(), BusError> {
        self.write_bytes(address, register, &[value])
    }
}

impl<B: Bus + ?Sized> Bus for &mut B {
    fn ping(&mut self, address: u8) -> Result<(), BusError> {
        (**self).ping(address)
    }

    fn read_bytes(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), BusError> {
        (**self).read_bytes(address, register, buf)
    }

    fn write_bytes(&mut self, address: u8, register: u8, values: &[u8]) -> Result<(), BusError> {
        (**self).write_bytes(address, register, values)
    }
}

/// Linux `/dev/i2c-*` access. The slave address is set before every
/// transaction so one `I2c` can be shared between devices.
impl Bus for I2c {
    fn ping(&mut self, address: u8) -> Result<(), BusError> {
        self.set_slave_address(u16::from(address))?;
        self.smbus_quick_command(false)?;
        Ok(())
    }

    fn read_bytes(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.set_slave_address(u16::from(address))?;
        self.write(&[register])?;
        let got = self.read(buf)?;
        debug!("Received from {:#04X}: {:?}", register, buf);
        if got < buf.len() {
            return Err(BusError::ShortRead {
                register,
                expected: buf.len(),
                got,
            });
        }
        Ok(())
    }

    fn write_bytes(&mut self, address: u8, register: u8, values: &[u8]) -> Result<(), BusError> {
        self.set_slave_address(u16::from(address))?;
        let mut frame = Vec::with_capacity(values.len() + 1);
        frame.push(register);
        frame.extend_from_slice(values);
        let sent = self.write(&frame)?;
        if sent < frame.len() {
            return Err(BusError::ShortWrite {
                register,
                expected: values.len(),
                got: sent.saturating_sub(1),
            });
        }
        Ok(())
    }
}

/// Adapter for any `embedded-hal` 0.2 blocking I2C peripheral.
///
/// The HAL traits only report success or failure, so errors are carried as
/// their `Debug` rendering.
pub struct HalBus<I>(pub I);

impl<I> HalBus<I> {
    pub fn new(i2c: I) -> Self {
        HalBus(i2c)
    }

    pub fn into_inner(self) -> I {
        self.0
    }
}

fn hal_error<E: Debug>(e: E) -> BusError {
    BusError::Hal(format!("{:?}", e))
}

impl<I, E> Bus for HalBus<I>
where
    I: hal_i2c::Write<Error = E> + hal_i2c::WriteRead<Error = E>,
    E: Debug,
{
    fn ping(&mut self, address: u8) -> Result<(), BusError> {
        hal_i2c::Write::write(&mut self.0, address, &[]).map_err(hal_error)
    }

    fn read_bytes(&mut self, address: u8, register: u8, buf: &mut [u8]) -> Result<(), BusError> {
        hal_i2c::WriteRead::write_read(&mut self.0, address, &[register], buf).map_err(hal_error)?;
        debug!("Received from {:#04X}: {:?}", register, buf);
        Ok(())
    }

    fn write_bytes(&mut self, address: u8, register: u8, values: &[u8]) -> Result<(), BusError> {
        let mut frame = Vec::with_capacity(values.len() + 1);
        frame.push(register);
        frame.extend_from_slice(values);
        hal_i2c::Write::write(&mut self.0, address, &frame).map_err(hal_error)
    }
}
