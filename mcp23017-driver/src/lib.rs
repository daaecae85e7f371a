//! Blocking driver for the Microchip MCP23017 16-bit I2C GPIO expander.
//!
//! The driver is generic over any [`embedded_hal::i2c::I2c`] implementation,
//! so the same code runs on Linux (`linux-embedded-hal`'s `I2cdev`) and on
//! bare-metal targets.
//!
//! # Architecture
//!
//! - **`driver`** (crate-private) handles byte-level register transactions,
//!   read-modify-write bit updates and last-error bookkeeping.
//! - **[`Mcp23017`]** (public) is the validated pin-level API: direction,
//!   pull-ups, interrupt setup and the interrupt-capture reads.
//!
//! # Quick start
//!
//! ```ignore
//! use mcp23017_driver::{Mcp23017, PinConfig, Port};
//!
//! let mut mcp = Mcp23017::new(i2c, 0x21);
//! mcp.init()?;
//! mcp.configure_pin(3, PinConfig::encoder_input())?;
//!
//! // Reading INTCAP returns the latched levels and clears the interrupt.
//! let captured = mcp.read_interrupt_capture(Port::A)?;
//! ```
//!
//! # Features
//!
//! - **`defmt`**: [`defmt::Format`] implementations for the public types.
//! - **`sim`**: [`sim::SimulatedExpander`], an in-memory chip for host
//!   tests. Pulls in `std`.

#![cfg_attr(not(any(test, feature = "sim")), no_std)]

pub use embedded_hal::i2c::ErrorKind;
pub use error::ExpanderError;
pub use expander::Mcp23017;
pub use pin::{bit_for_pin, register_for_pin, Direction, InterruptMode, Level, PinConfig, Port};
pub use registers::{DEFAULT_ADDRESS, PIN_COUNT};

mod driver;
mod error;
mod expander;
mod pin;
pub mod registers;

#[cfg(any(test, feature = "sim"))]
pub mod sim;
