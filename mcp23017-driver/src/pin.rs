//! Pin-level types and the pin → port/bit mapping.

use crate::registers::PIN_COUNT;

/// One of the two 8-bit halves of the GPIO register set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Port {
    /// Pins 0–7.
    A,
    /// Pins 8–15.
    B,
}

impl Port {
    /// Port owning `pin`: A for pins below 8, B otherwise.
    pub fn of(pin: u8) -> Self {
        if pin < 8 {
            Port::A
        } else {
            Port::B
        }
    }

    /// Select between the port A and port B address of a register pair.
    pub fn register(self, port_a: u8, port_b: u8) -> u8 {
        match self {
            Port::A => port_a,
            Port::B => port_b,
        }
    }
}

/// Bit offset of `pin` inside its port register.
pub fn bit_for_pin(pin: u8) -> u8 {
    pin % 8
}

/// Register address, port dependent, for `pin`.
pub fn register_for_pin(pin: u8, port_a: u8, port_b: u8) -> u8 {
    Port::of(pin).register(port_a, port_b)
}

/// `true` when `pin` exists on the chip.
pub fn is_valid_pin(pin: u8) -> bool {
    pin < PIN_COUNT
}

/// Pin direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Input,
    Output,
}

/// Logic level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        level == Level::High
    }
}

/// Condition that raises a pin's interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptMode {
    /// Any change from the previous pin value.
    Change,
    /// Pin differs from a default of 0, i.e. goes high.
    Rising,
    /// Pin differs from a default of 1, i.e. goes low.
    Falling,
}

/// Full configuration of a single pin, applied by
/// [`Mcp23017::configure_pin`](crate::Mcp23017::configure_pin).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinConfig {
    pub direction: Direction,
    /// Enable the internal 100 kΩ pull-up.
    pub pull_up: bool,
    /// `None` disables the pin's interrupt.
    pub interrupt: Option<InterruptMode>,
}

impl PinConfig {
    /// Pulled-up input interrupting on every change. This is how encoder
    /// pins are wired.
    pub const fn encoder_input() -> Self {
        Self {
            direction: Direction::Input,
            pull_up: true,
            interrupt: Some(InterruptMode::Change),
        }
    }
}
