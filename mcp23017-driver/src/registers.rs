//! MCP23017 register addresses.
//!
//! Addresses assume the power-on default `IOCON.BANK = 0`, where every
//! port A register is immediately followed by its port B twin. That layout
//! is what makes the two-byte sequential reads in [`crate::Mcp23017`] work.

// ---------------------------------------------------------------------------
// Port A / port B register pairs
// ---------------------------------------------------------------------------

/// I/O direction. A set bit makes the pin an input.
pub const IODIRA: u8 = 0x00;
pub const IODIRB: u8 = 0x01;

/// Input polarity inversion.
#[allow(dead_code)]
pub const IPOLA: u8 = 0x02;
#[allow(dead_code)]
pub const IPOLB: u8 = 0x03;

/// Interrupt-on-change enable.
pub const GPINTENA: u8 = 0x04;
pub const GPINTENB: u8 = 0x05;

/// Default compare value, used when `INTCON` selects compare mode.
pub const DEFVALA: u8 = 0x06;
pub const DEFVALB: u8 = 0x07;

/// Interrupt control. Clear bit: compare against the previous pin value.
/// Set bit: compare against `DEFVAL`.
pub const INTCONA: u8 = 0x08;
pub const INTCONB: u8 = 0x09;

/// Device configuration. Both addresses alias the same physical register.
pub const IOCONA: u8 = 0x0A;
pub const IOCONB: u8 = 0x0B;

/// 100 kΩ pull-up enable.
pub const GPPUA: u8 = 0x0C;
pub const GPPUB: u8 = 0x0D;

/// Interrupt flags (read-only). A set bit marks the pin that raised the
/// pending interrupt.
pub const INTFA: u8 = 0x0E;
pub const INTFB: u8 = 0x0F;

/// Interrupt capture (read-only). Holds the port levels latched when the
/// interrupt fired. Reading it clears the port's pending interrupt.
pub const INTCAPA: u8 = 0x10;
pub const INTCAPB: u8 = 0x11;

/// Port levels. Reading clears the pending interrupt, writing sets `OLAT`.
pub const GPIOA: u8 = 0x12;
pub const GPIOB: u8 = 0x13;

/// Output latches.
pub const OLATA: u8 = 0x14;
pub const OLATB: u8 = 0x15;

/// Number of addressable registers in `BANK = 0` mode.
pub const REGISTER_COUNT: usize = 0x16;

// ---------------------------------------------------------------------------
// IOCON bits
// ---------------------------------------------------------------------------

/// INTA/INTB pins are internally OR-ed.
pub const IOCON_MIRROR: u8 = 6;
/// Sequential operation disabled (address pointer does not increment).
pub const IOCON_SEQOP: u8 = 5;
/// INT pins configured as open-drain outputs.
pub const IOCON_ODR: u8 = 2;
/// Polarity of the INT output pins (set = active-high).
pub const IOCON_INTPOL: u8 = 1;

// ---------------------------------------------------------------------------
// Device constants
// ---------------------------------------------------------------------------

/// Direction written to both IODIR registers by
/// [`Mcp23017::init`](crate::Mcp23017::init): everything is an input
/// except bit 0 of each port.
pub const INIT_IODIR: u8 = 0b1111_1110;

/// Base 7-bit address; A2..A0 strap pins select `0x20..=0x27`.
pub const DEFAULT_ADDRESS: u8 = 0x20;

/// Number of GPIO pins on the chip.
pub const PIN_COUNT: u8 = 16;
