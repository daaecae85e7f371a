//! The poll loop.
//!
//! Runs flat out on its own thread and is the only code that touches the
//! bus or the decoders. Each pass, per device:
//!
//! 1. read both interrupt-capture registers (a failed read skips the
//!    device for this pass),
//! 2. feed every pin pair's levels to its decoder,
//! 3. if the snapshot differs from the previous one seen here, wait for the
//!    contacts to settle and re-read port A's capture,
//! 4. if the device's snapshot or positions differ from the last state
//!    handed to the publisher, send the new state. A full channel defers
//!    the send to the next pass.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::{debug, trace};
use quadrature::Decode;

use crate::config::PinPair;
use crate::device::Device;
use crate::shutdown::CancellationToken;
use crate::state::{ChannelLayout, DeviceState, DeviceUpdate, Positions, UpdateSender};

/// What one [`Poller::pass`] did, summed over all devices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Devices whose capture read failed.
    pub failed_reads: usize,
    /// Devices whose snapshot changed and were debounced.
    pub debounced: usize,
    /// Updates handed to the publisher.
    pub sent: usize,
    /// Updates held back by a full channel.
    pub deferred: usize,
}

/// State of the poll loop, borrowed from the application context.
pub struct Poller<'a, I2C, D, DL> {
    devices: &'a mut [Device<I2C>],
    decoders: &'a mut [D],
    pin_pairs: &'a [PinPair],
    layout: ChannelLayout,
    sender: UpdateSender<'a>,
    delay: DL,
    debounce_us: u32,
    /// Last snapshot seen per device.
    history: Vec<u16>,
    /// Last state handed to the publisher per device.
    published: Vec<DeviceState>,
}

impl<'a, I2C, D, DL> Poller<'a, I2C, D, DL>
where
    I2C: I2c,
    D: Decode,
    DL: DelayNs,
{
    /// `decoders` holds `layout.channel_count()` entries, indexed by global
    /// channel.
    pub fn new(
        devices: &'a mut [Device<I2C>],
        decoders: &'a mut [D],
        pin_pairs: &'a [PinPair],
        sender: UpdateSender<'a>,
        delay: DL,
        debounce_us: u32,
    ) -> Self {
        let layout = ChannelLayout::new(devices.len(), pin_pairs.len());
        debug_assert_eq!(decoders.len(), layout.channel_count());
        Self {
            history: vec![0; devices.len()],
            published: vec![DeviceState::new(pin_pairs.len()); devices.len()],
            devices,
            decoders,
            pin_pairs,
            layout,
            sender,
            delay,
            debounce_us,
        }
    }

    pub fn layout(&self) -> ChannelLayout {
        self.layout
    }

    /// Poll every device once.
    pub fn pass(&mut self) -> PassReport {
        let mut report = PassReport::default();
        for device in 0..self.devices.len() {
            self.poll_device(device, &mut report);
        }
        report
    }

    /// Poll until `token` is cancelled.
    pub fn run(mut self, token: &CancellationToken) {
        debug!(
            "poll loop started: {} devices, {} channels",
            self.layout.devices(),
            self.layout.channel_count()
        );
        while !token.is_cancelled() {
            self.pass();
        }
        debug!("poll loop stopped");
    }

    fn poll_device(&mut self, device: usize, report: &mut PassReport) {
        let snapshot = match self.devices[device].read_snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                trace!("{}: capture read failed: {}", self.devices[device].address(), e);
                report.failed_reads += 1;
                return;
            }
        };

        let channels = self.layout.channels_of(device);
        for (decoder, pair) in self.decoders[channels.clone()].iter_mut().zip(self.pin_pairs) {
            let (a, b) = pair.levels(snapshot);
            decoder.process(a, b);
        }

        if snapshot != self.history[device] {
            self.history[device] = snapshot;
            self.delay.delay_us(self.debounce_us);
            // Port B is left pending; its next capture read clears it.
            if let Err(e) = self.devices[device].flush_port_a() {
                trace!("{}: port A flush failed: {}", self.devices[device].address(), e);
            }
            report.debounced += 1;
        }

        let mut positions = Positions::new();
        for decoder in &self.decoders[channels] {
            // At most eight pairs per device, checked at startup.
            let _ = positions.push(decoder.position());
        }
        let state = DeviceState {
            snapshot,
            positions,
        };
        if state == self.published[device] {
            return;
        }

        match self.sender.try_send(DeviceUpdate {
            device,
            state: state.clone(),
        }) {
            Ok(()) => {
                self.published[device] = state;
                report.sent += 1;
            }
            Err(_) => report.deferred += 1,
        }
    }
}
