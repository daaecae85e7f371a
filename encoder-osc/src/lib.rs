//! encoder-osc
//!
//! Reads rotary encoders wired to MCP23017 expanders on a Linux I2C bus and
//! publishes their positions as OSC over UDP:
//!
//! 1. An encoder is turned; the expander latches both ports into its
//!    interrupt-capture registers.
//! 2. The poll loop ([`poll`]) reads every device's captures, feeds each pin
//!    pair to its quadrature decoder, debounces, and hands the device's
//!    absolute state to the publisher over a bounded channel ([`state`]).
//! 3. Every 10 ms the publisher ([`publish`]) diffs what it received against
//!    the previous cycle and sends one datagram of `/encoder <channel>
//!    <position>` messages ([`osc`]).
//!
//! Channel `m * pairs + n` is pin pair `n` of the `m`-th device that opened.
//! With the default wiring that is four channels per board and up to 16
//! channels.

pub mod app;
pub mod cli;
pub mod config;
pub mod device;
pub mod diagnostics;
pub mod error;
pub mod osc;
pub mod poll;
pub mod publish;
pub mod shutdown;
pub mod state;

pub use app::{run, run_loops, Context};
pub use config::{BusAddress, Config, PinPair};
pub use device::Device;
pub use error::{ConfigError, OpenError, StartupError};
pub use osc::{ChannelMessage, Transport, UdpTransport};
pub use shutdown::CancellationToken;
