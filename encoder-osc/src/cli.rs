//! Command-line overrides for the network side of [`Config`].

use std::net::{Ipv4Addr, SocketAddrV4};

use clap::Parser;

use crate::config::{Config, DEFAULT_HOST, DEFAULT_OSC_ADDRESS, DEFAULT_PORT};

#[derive(Parser, Debug)]
#[command(
    name = "encoder-osc",
    version,
    about = "Publish MCP23017 rotary encoder positions as OSC over UDP"
)]
pub struct Cli {
    /// IPv4 address receiving the OSC datagrams
    #[arg(long, default_value_t = DEFAULT_HOST)]
    pub host: Ipv4Addr,

    /// UDP port receiving the OSC datagrams
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// OSC address of every message
    #[arg(long, default_value = DEFAULT_OSC_ADDRESS)]
    pub osc_address: String,

    /// Log level used when RUST_LOG is not set (error, warn, info, debug, trace)
    #[arg(short, long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Apply the overrides on top of `config`.
    pub fn apply(&self, config: Config) -> Config {
        Config {
            endpoint: SocketAddrV4::new(self.host, self.port),
            osc_address: self.osc_address.clone(),
            ..config
        }
    }
}
