//! Low-level register access.
//!
//! Implements byte-granular register reads and writes plus the
//! read-modify-write bit update that every pin-level setting is built on.
//! Each failed transaction is logged and its error kind cached before the
//! error is handed back; nothing is retried.
//!
//! This module is crate-private. Consumers use [`Mcp23017`] in
//! `expander.rs`.
//!
//! [`Mcp23017`]: crate::Mcp23017

use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

use crate::error::ExpanderError;
use crate::pin::{bit_for_pin, is_valid_pin, register_for_pin};

/// Owns the I2C handle of one chip and remembers the last bus failure.
pub(crate) struct RegisterBus<I2C> {
    i2c: I2C,
    address: u8,
    last_error: Option<ErrorKind>,
}

impl<I2C> RegisterBus<I2C>
where
    I2C: I2c,
{
    pub fn new(i2c: I2C, address: u8) -> Self {
        Self {
            i2c,
            address,
            last_error: None,
        }
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn last_error(&self) -> Option<ErrorKind> {
        self.last_error
    }

    pub fn release(self) -> I2C {
        self.i2c
    }

    // -----------------------------------------------------------------------
    // Core transactions
    // -----------------------------------------------------------------------

    /// Record a failed transaction and wrap it for the caller.
    fn fail(&mut self, op: &str, register: u8, error: I2C::Error) -> ExpanderError<I2C::Error> {
        let kind = error.kind();
        log::warn!(
            "MCP23017 0x{:02X}: {} of register 0x{:02X} failed: {:?}",
            self.address,
            op,
            register,
            kind
        );
        self.last_error = Some(kind);
        ExpanderError::I2c(error)
    }

    /// Read one register.
    ///
    /// Writes the register address and reads the value back behind a
    /// repeated start, so no other master can move the address pointer in
    /// between.
    pub fn read_register(&mut self, register: u8) -> Result<u8, ExpanderError<I2C::Error>> {
        let mut buf = [0u8; 1];
        match self.i2c.write_read(self.address, &[register], &mut buf) {
            Ok(()) => Ok(buf[0]),
            Err(e) => Err(self.fail("read", register, e)),
        }
    }

    /// Read `buf.len()` consecutive registers starting at `register`.
    ///
    /// Relies on sequential operation (`IOCON.SEQOP = 0`, the default).
    pub fn read_registers(
        &mut self,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), ExpanderError<I2C::Error>> {
        match self.i2c.write_read(self.address, &[register], buf) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail("sequential read", register, e)),
        }
    }

    /// Write one register.
    pub fn write_register(
        &mut self,
        register: u8,
        value: u8,
    ) -> Result<(), ExpanderError<I2C::Error>> {
        match self.i2c.write(self.address, &[register, value]) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail("write", register, e)),
        }
    }

    /// Write a port A/B register pair in one sequential transaction.
    pub fn write_register_pair(
        &mut self,
        register: u8,
        values: [u8; 2],
    ) -> Result<(), ExpanderError<I2C::Error>> {
        let buf = [register, values[0], values[1]];

        match self.i2c.write(self.address, &buf) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail("sequential write", register, e)),
        }
    }

    /// Read one byte at the current address pointer, without addressing.
    pub fn read_byte(&mut self) -> Result<u8, ExpanderError<I2C::Error>> {
        let mut buf = [0u8; 1];
        match self.i2c.read(self.address, &mut buf) {
            Ok(()) => Ok(buf[0]),
            Err(e) => Err(self.fail("raw read", 0xFF, e)),
        }
    }

    /// Write one raw byte. The chip treats the first byte of a write as the
    /// new address pointer.
    pub fn write_byte(&mut self, value: u8) -> Result<(), ExpanderError<I2C::Error>> {
        match self.i2c.write(self.address, &[value]) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.fail("raw write", value, e)),
        }
    }

    // -----------------------------------------------------------------------
    // Read-modify-write helpers
    // -----------------------------------------------------------------------

    /// Set or clear one bit of a register.
    ///
    /// Nothing is written when the read fails.
    pub fn update_register(
        &mut self,
        register: u8,
        bit: u8,
        set: bool,
    ) -> Result<(), ExpanderError<I2C::Error>> {
        let value = self.read_register(register)?;
        self.write_register(register, with_bit(value, bit, set))
    }

    /// Set or clear `pin`'s bit in the port A/B register pair.
    pub fn update_register_bit(
        &mut self,
        pin: u8,
        set: bool,
        port_a: u8,
        port_b: u8,
    ) -> Result<(), ExpanderError<I2C::Error>> {
        if !is_valid_pin(pin) {
            return Err(ExpanderError::InvalidPin(pin));
        }
        self.update_register(register_for_pin(pin, port_a, port_b), bit_for_pin(pin), set)
    }
}

/// `value` with bit `index` set to `set`.
pub(crate) fn with_bit(value: u8, index: u8, set: bool) -> u8 {
    if set {
        value | (1 << index)
    } else {
        value & !(1 << index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_bit_sets_and_clears() {
        assert_eq!(with_bit(0b0000_0000, 3, true), 0b0000_1000);
        assert_eq!(with_bit(0b1111_1111, 3, false), 0b1111_0111);
        assert_eq!(with_bit(0b0000_1000, 3, true), 0b0000_1000);
        assert_eq!(with_bit(0b0000_0000, 7, false), 0);
    }
}
