//! The publish loop.
//!
//! Every period the publisher drains the state channel (keeping only the
//! newest state per device), compares each device against what it observed
//! on the previous cycle, and sends one datagram with a message per changed
//! channel. It never touches the bus.

use std::time::Duration;

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::diagnostics;
use crate::osc::{self, ChannelMessage, Transport};
use crate::shutdown::CancellationToken;
use crate::state::{ChannelLayout, DeviceState, UpdateReceiver};

/// What one [`Publisher::cycle`] produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Channels that changed, in ascending channel order.
    pub messages: Vec<ChannelMessage>,
    /// A datagram was handed to the transport without error.
    pub datagram_sent: bool,
    /// Diagnostic lines logged this cycle.
    pub diagnostics: Vec<String>,
}

pub struct Publisher<'a, T> {
    receiver: UpdateReceiver<'a>,
    transport: T,
    layout: ChannelLayout,
    osc_address: &'a str,
    /// Newest state received per device.
    current: Vec<DeviceState>,
    /// State as of the previous cycle.
    observed: Vec<DeviceState>,
}

impl<'a, T: Transport> Publisher<'a, T> {
    pub fn new(
        receiver: UpdateReceiver<'a>,
        transport: T,
        layout: ChannelLayout,
        osc_address: &'a str,
    ) -> Self {
        let idle = vec![DeviceState::new(layout.pairs_per_device()); layout.devices()];
        Self {
            receiver,
            transport,
            layout,
            osc_address,
            current: idle.clone(),
            observed: idle,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run one publish cycle.
    pub fn cycle(&mut self) -> CycleReport {
        self.drain();

        let mut report = CycleReport::default();
        for device in 0..self.layout.devices() {
            let current = &self.current[device];
            let observed = &self.observed[device];
            let channels = self.layout.channels_of(device);

            let mut moved = false;
            for ((channel, &now), &before) in channels
                .zip(current.positions.iter())
                .zip(observed.positions.iter())
            {
                if now != before {
                    moved = true;
                    info!("{} {} {}", self.osc_address, channel, now);
                    report.messages.push(ChannelMessage {
                        channel: channel as i32,
                        position: now,
                    });
                }
            }

            let line = if moved {
                Some(diagnostics::device_line(
                    device,
                    current.snapshot,
                    &current.positions,
                ))
            } else if current.snapshot != observed.snapshot {
                Some(diagnostics::snapshot_line(device, current.snapshot))
            } else {
                None
            };
            if let Some(line) = line {
                info!("{line}");
                report.diagnostics.push(line);
            }
        }
        self.observed.clone_from(&self.current);

        if !report.messages.is_empty() {
            report.datagram_sent = self.send(&report.messages);
        }
        report
    }

    /// Publish every `period` until `token` is cancelled.
    pub fn run<DL: DelayNs>(mut self, token: &CancellationToken, mut delay: DL, period: Duration) {
        let period_us = u32::try_from(period.as_micros()).unwrap_or(u32::MAX);
        debug!("publish loop started: every {:?}", period);
        while !token.is_cancelled() {
            self.cycle();
            delay.delay_us(period_us);
        }
        debug!("publish loop stopped");
    }

    fn drain(&mut self) {
        while let Ok(update) = self.receiver.try_receive() {
            match self.current.get_mut(update.device) {
                Some(slot) => *slot = update.state,
                None => warn!("update for unknown device {}", update.device),
            }
        }
    }

    fn send(&mut self, messages: &[ChannelMessage]) -> bool {
        let datagram = match osc::encode_batch(self.osc_address, messages) {
            Ok(datagram) => datagram,
            Err(e) => {
                warn!("cannot encode OSC batch: {e}");
                return false;
            }
        };
        match self.transport.send(&datagram) {
            Ok(_) => true,
            Err(e) => {
                debug!("send failed: {e}");
                false
            }
        }
    }
}
