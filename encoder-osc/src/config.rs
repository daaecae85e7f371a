//! Static configuration.
//!
//! [`Config::default()`] describes the installed hardware: four expander
//! boards on I2C bus 1, each wired with the same four encoders. The bus
//! topology is fixed at build time; only the network side can be
//! overridden from the command line (see [`crate::cli::Cli`]).

use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use mcp23017_driver::PIN_COUNT;
use quadrature::Polarity;

use crate::error::ConfigError;

// ── Defaults ─────────────────────────────────────────────────────────────

/// Linux I2C bus the expanders hang off (`/dev/i2c-1`).
pub const DEFAULT_BUS: u8 = 1;

/// 7-bit addresses of the expander boards, in channel order.
pub const DEFAULT_ADDRESSES: [u8; 4] = [0x21, 0x22, 0x26, 0x27];

/// Encoder wiring, identical on every board: `(pin A, pin B)` per channel.
pub const DEFAULT_PIN_PAIRS: [PinPair; 4] = [
    PinPair::new(0, 1),
    PinPair::new(3, 2),
    PinPair::new(9, 8),
    PinPair::new(12, 13),
];

/// Host computer as seen from the board over USB networking.
pub const DEFAULT_HOST: Ipv4Addr = Ipv4Addr::new(192, 168, 7, 1);

pub const DEFAULT_PORT: u16 = 5555;

/// OSC address of every outgoing message: `<address> <channel> <position>`.
pub const DEFAULT_OSC_ADDRESS: &str = "/encoder";

pub const PUBLISH_PERIOD: Duration = Duration::from_millis(10);

pub const DEBOUNCE_DELAY: Duration = Duration::from_millis(1);

/// Two pins per channel, so a 16-pin chip holds at most eight channels.
pub const MAX_PAIRS_PER_DEVICE: usize = PIN_COUNT as usize / 2;

// ── BusAddress ───────────────────────────────────────────────────────────

/// Location of one chip: Linux bus number plus 7-bit device address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusAddress {
    pub bus: u8,
    pub address: u8,
}

impl BusAddress {
    pub const fn new(bus: u8, address: u8) -> Self {
        Self { bus, address }
    }

    /// Device node of the bus, e.g. `/dev/i2c-1`.
    pub fn device_path(&self) -> String {
        format!("/dev/i2c-{}", self.bus)
    }
}

impl fmt::Display for BusAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i2c-{}@{:#04x}", self.bus, self.address)
    }
}

// ── PinPair ──────────────────────────────────────────────────────────────

/// The two expander pins carrying one encoder's A and B channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinPair {
    pub a: u8,
    pub b: u8,
}

impl PinPair {
    pub const fn new(a: u8, b: u8) -> Self {
        Self { a, b }
    }

    /// Levels of the pair within a 16-bit snapshot (port B in the high byte).
    pub fn levels(&self, snapshot: u16) -> (bool, bool) {
        (snapshot & (1 << self.a) != 0, snapshot & (1 << self.b) != 0)
    }
}

// ── Config ───────────────────────────────────────────────────────────────

/// Everything fixed at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Chips to open, in channel order.
    pub devices: Vec<BusAddress>,
    /// Encoder wiring applied to every chip.
    pub pin_pairs: Vec<PinPair>,
    /// Destination of the OSC datagrams.
    pub endpoint: SocketAddrV4,
    pub osc_address: String,
    /// Publisher cadence. Default: 10 ms.
    pub publish_period: Duration,
    /// Settle time after a snapshot change. Default: 1 ms.
    pub debounce: Duration,
    pub polarity: Polarity,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            devices: DEFAULT_ADDRESSES
                .iter()
                .map(|&address| BusAddress::new(DEFAULT_BUS, address))
                .collect(),
            pin_pairs: DEFAULT_PIN_PAIRS.to_vec(),
            endpoint: SocketAddrV4::new(DEFAULT_HOST, DEFAULT_PORT),
            osc_address: DEFAULT_OSC_ADDRESS.to_string(),
            publish_period: PUBLISH_PERIOD,
            debounce: DEBOUNCE_DELAY,
            polarity: Polarity::ActiveHigh,
        }
    }
}

impl Config {
    /// Number of encoder channels on each chip.
    pub fn pairs_per_device(&self) -> usize {
        self.pin_pairs.len()
    }

    /// Check the tables before any hardware is touched.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.devices.is_empty() {
            return Err(ConfigError::NoDevices);
        }
        if self.pin_pairs.is_empty() {
            return Err(ConfigError::NoPinPairs);
        }
        if self.pin_pairs.len() > MAX_PAIRS_PER_DEVICE {
            return Err(ConfigError::TooManyPinPairs {
                count: self.pin_pairs.len(),
                max: MAX_PAIRS_PER_DEVICE,
            });
        }
        for (pair, pins) in self.pin_pairs.iter().enumerate() {
            for pin in [pins.a, pins.b] {
                if pin >= PIN_COUNT {
                    return Err(ConfigError::InvalidPin { pair, pin });
                }
            }
            if pins.a == pins.b {
                return Err(ConfigError::SamePin { pair, pin: pins.a });
            }
        }
        if !self.osc_address.starts_with('/') {
            return Err(ConfigError::OscAddress(self.osc_address.clone()));
        }
        Ok(())
    }
}
