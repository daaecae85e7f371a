//! Error types for the MCP23017 driver.

use core::fmt;

/// Errors that can occur when talking to an MCP23017.
#[derive(Debug)]
pub enum ExpanderError<E> {
    /// Underlying I2C bus error.
    I2c(E),

    /// Pin index out of range (must be 0–15).
    InvalidPin(u8),
}

// Allow ergonomic `?` propagation from raw I2C errors.
impl<E> From<E> for ExpanderError<E> {
    fn from(error: E) -> Self {
        ExpanderError::I2c(error)
    }
}

impl<E: fmt::Debug> fmt::Display for ExpanderError<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExpanderError::I2c(e) => write!(f, "I2C error: {:?}", e),
            ExpanderError::InvalidPin(pin) => {
                write!(f, "Invalid pin {} (must be 0-15)", pin)
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl<E: defmt::Format> defmt::Format for ExpanderError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            ExpanderError::I2c(e) => defmt::write!(f, "I2C error: {}", e),
            ExpanderError::InvalidPin(pin) => defmt::write!(f, "Invalid pin {}", pin),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for ExpanderError<E> {}
