//! Error types for startup and configuration.
//!
//! Nothing here reaches the network side: once both loops run, failures
//! are only logged (bus errors additionally stay cached on the driver).

use std::io;
use std::net::SocketAddrV4;

use thiserror::Error;

/// Invalid static configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no devices configured")]
    NoDevices,

    #[error("no pin pairs configured")]
    NoPinPairs,

    #[error("{count} pin pairs configured, at most {max} fit on one device")]
    TooManyPinPairs { count: usize, max: usize },

    #[error("pin {pin} of pair {pair} is out of range (must be 0-15)")]
    InvalidPin { pair: usize, pin: u8 },

    #[error("pair {pair} uses pin {pin} for both channels")]
    SamePin { pair: usize, pin: u8 },

    #[error("OSC address {0:?} must start with '/'")]
    OscAddress(String),
}

/// A chip could not be brought up. The device is dropped; others carry on.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error("cannot open {path}: {reason}")]
    Bus { path: String, reason: String },

    #[error("device rejected initial configuration: {0}")]
    Init(String),
}

/// Failures that stop the process before either loop starts.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unable to send to {endpoint}: {source}")]
    Transport {
        endpoint: SocketAddrV4,
        #[source]
        source: io::Error,
    },

    #[error("no device detected")]
    NoDevices,

    #[error("cannot install signal handler: {0}")]
    SignalHandler(#[from] ctrlc::Error),
}
