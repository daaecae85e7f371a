//! Opened expander chips.
//!
//! A [`Device`] owns its bus handle exclusively; once opened, it is only
//! touched by the poll loop.

use embedded_hal::i2c::I2c;
use linux_embedded_hal::I2cdev;
use log::{info, warn};
use mcp23017_driver::{ExpanderError, Level, Mcp23017, PinConfig, Port, PIN_COUNT};

use crate::config::BusAddress;
use crate::error::OpenError;

/// One opened MCP23017.
pub struct Device<I2C> {
    address: BusAddress,
    expander: Mcp23017<I2C>,
}

impl<I2C: I2c> Device<I2C> {
    /// Take over `i2c` and write the initial direction registers.
    pub fn open(address: BusAddress, i2c: I2C) -> Result<Self, OpenError> {
        let mut expander = Mcp23017::new(i2c, address.address);
        expander
            .init()
            .map_err(|e| OpenError::Init(e.to_string()))?;
        Ok(Self { address, expander })
    }

    pub fn address(&self) -> BusAddress {
        self.address
    }

    pub fn expander(&mut self) -> &mut Mcp23017<I2C> {
        &mut self.expander
    }

    /// Make every pin a pulled-up input interrupting on change, with
    /// mirrored active-high push-pull INT outputs.
    ///
    /// Failures are logged and skipped. Returns the number of steps that
    /// failed.
    pub fn configure_for_encoders(&mut self) -> usize {
        let mut failures = 0;
        for pin in 0..PIN_COUNT {
            if let Err(e) = self.expander.configure_pin(pin, PinConfig::encoder_input()) {
                warn!("{}: configuring pin {} failed: {}", self.address, pin, e);
                failures += 1;
            }
        }
        if let Err(e) = self.expander.setup_interrupts(true, false, Level::High) {
            warn!("{}: configuring interrupt outputs failed: {}", self.address, e);
            failures += 1;
        }
        failures
    }

    /// Captured levels of both ports; clears both pending interrupts.
    pub fn read_snapshot(&mut self) -> Result<u16, ExpanderError<I2C::Error>> {
        self.expander.read_interrupt_capture_both()
    }

    /// Re-read the port A capture to clear an interrupt raised while the
    /// contacts settled. Port B is left pending.
    pub fn flush_port_a(&mut self) -> Result<u8, ExpanderError<I2C::Error>> {
        self.expander.read_interrupt_capture(Port::A)
    }
}

/// Open the Linux bus node for `address` and bring the chip up.
pub fn open_linux(address: BusAddress) -> Result<Device<I2cdev>, OpenError> {
    let path = address.device_path();
    let i2c = I2cdev::new(&path).map_err(|e| OpenError::Bus {
        path: path.clone(),
        reason: e.to_string(),
    })?;
    Device::open(address, i2c)
}

/// Open every address in order with `connect`.
///
/// Failed devices are logged and left out; the survivors keep their
/// relative order and are packed into contiguous slots.
pub fn open_all<I2C, F>(addresses: &[BusAddress], mut connect: F) -> Vec<Device<I2C>>
where
    I2C: I2c,
    F: FnMut(BusAddress) -> Result<Device<I2C>, OpenError>,
{
    let mut devices = Vec::with_capacity(addresses.len());
    for &address in addresses {
        match connect(address) {
            Ok(device) => {
                info!("{}: opened as device {}", address, devices.len());
                devices.push(device);
            }
            Err(e) => warn!(
                "Failed to open device on bus {}, address {:#x}: {}",
                address.bus, address.address, e
            ),
        }
    }
    devices
}
