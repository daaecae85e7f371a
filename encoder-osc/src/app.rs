//! Startup and the two-loop runtime.

use std::thread;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use linux_embedded_hal::{Delay, I2cdev};
use log::{debug, info};
use quadrature::{Decode, QuadratureDecoder};

use crate::config::Config;
use crate::device::{self, Device};
use crate::error::StartupError;
use crate::osc::{Transport, UdpTransport};
use crate::poll::Poller;
use crate::publish::Publisher;
use crate::shutdown::{self, CancellationToken};
use crate::state::{ChannelLayout, UpdateChannel};

/// Everything built once at startup and borrowed by the loops.
pub struct Context<I2C, D> {
    /// Opened devices, packed into contiguous slots.
    pub devices: Vec<Device<I2C>>,
    /// One decoder per channel, indexed by global channel.
    pub decoders: Vec<D>,
    pub layout: ChannelLayout,
}

impl<I2C: I2c, D: Decode> Context<I2C, D> {
    /// Lay out channels over the devices that opened.
    ///
    /// Fails with [`StartupError::NoDevices`] when `devices` is empty.
    pub fn new(
        devices: Vec<Device<I2C>>,
        pairs_per_device: usize,
        make_decoder: impl FnMut() -> D,
    ) -> Result<Self, StartupError> {
        if devices.is_empty() {
            return Err(StartupError::NoDevices);
        }
        let layout = ChannelLayout::new(devices.len(), pairs_per_device);
        let decoders = std::iter::repeat_with(make_decoder)
            .take(layout.channel_count())
            .collect();
        Ok(Self {
            devices,
            decoders,
            layout,
        })
    }

    /// Put every pin of every device into encoder mode.
    pub fn configure_pins(&mut self) {
        for device in &mut self.devices {
            let failures = device.configure_for_encoders();
            if failures > 0 {
                info!("{}: {} configuration steps failed", device.address(), failures);
            }
        }
    }
}

/// Run the poll loop on this thread and the publisher on a scoped thread
/// until `token` is cancelled.
///
/// Both loops have stopped when this returns.
pub fn run_loops<I2C, D, T, PD, QD>(
    context: &mut Context<I2C, D>,
    config: &Config,
    transport: T,
    token: &CancellationToken,
    poll_delay: PD,
    publish_delay: QD,
) where
    I2C: I2c,
    D: Decode,
    T: Transport + Send,
    PD: DelayNs,
    QD: DelayNs + Send,
{
    let channel = UpdateChannel::new();
    let debounce_us = u32::try_from(config.debounce.as_micros()).unwrap_or(u32::MAX);

    thread::scope(|scope| {
        let publisher = Publisher::new(
            channel.receiver(),
            transport,
            context.layout,
            &config.osc_address,
        );
        let period = config.publish_period;
        scope.spawn(move || publisher.run(token, publish_delay, period));

        let poller = Poller::new(
            &mut context.devices,
            &mut context.decoders,
            &config.pin_pairs,
            channel.sender(),
            poll_delay,
            debounce_us,
        );
        poller.run(token);
    });
    debug!("both loops stopped");
}

/// Bring the hardware and network up, then run until SIGINT or SIGTERM.
pub fn run(config: Config) -> Result<(), StartupError> {
    config.validate()?;

    let transport = UdpTransport::connect(config.endpoint).map_err(|source| {
        StartupError::Transport {
            endpoint: config.endpoint,
            source,
        }
    })?;
    info!("sending OSC {} to {}", config.osc_address, transport.endpoint());

    let devices = device::open_all(&config.devices, device::open_linux);
    info!("{} encoder boards detected", devices.len());

    let mut context: Context<I2cdev, QuadratureDecoder> =
        Context::new(devices, config.pairs_per_device(), || {
            QuadratureDecoder::new(config.polarity)
        })?;
    context.configure_pins();

    let token = CancellationToken::new();
    shutdown::cancel_on_signal(&token)?;

    run_loops(&mut context, &config, transport, &token, Delay, Delay);
    info!("stopped");
    Ok(())
}
