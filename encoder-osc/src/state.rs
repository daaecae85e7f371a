//! State handed from the poll stage to the publisher.
//!
//! The poll loop is the only producer and the publisher the only consumer
//! of an [`UpdateChannel`]. Each [`DeviceUpdate`] carries the absolute
//! snapshot and positions of one device, never deltas, so the consumer can
//! coalesce several updates for the same device and a deferred send loses
//! nothing.

use std::ops::Range;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};
use heapless::Vec as FixedVec;

use crate::config::MAX_PAIRS_PER_DEVICE;

/// Capacity of the poll → publish channel.
pub const UPDATE_CAPACITY: usize = 64;

/// Positions of one device's channels, in pin-pair order.
pub type Positions = FixedVec<i32, MAX_PAIRS_PER_DEVICE>;

pub type UpdateChannel = Channel<CriticalSectionRawMutex, DeviceUpdate, UPDATE_CAPACITY>;
pub type UpdateSender<'a> = Sender<'a, CriticalSectionRawMutex, DeviceUpdate, UPDATE_CAPACITY>;
pub type UpdateReceiver<'a> = Receiver<'a, CriticalSectionRawMutex, DeviceUpdate, UPDATE_CAPACITY>;

// ── DeviceState ──────────────────────────────────────────────────────────

/// What one device looked like at the end of a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    /// Interrupt-capture levels, port B in the high byte.
    pub snapshot: u16,
    pub positions: Positions,
}

impl DeviceState {
    /// All-zero state for a device with `pairs` channels.
    pub fn new(pairs: usize) -> Self {
        let mut positions = Positions::new();
        // `pairs` is bounded by `Config::validate`.
        let _ = positions.resize(pairs.min(MAX_PAIRS_PER_DEVICE), 0);
        Self {
            snapshot: 0,
            positions,
        }
    }
}

/// One message on the state channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceUpdate {
    /// Device slot (index into the opened-device array).
    pub device: usize,
    pub state: DeviceState,
}

// ── ChannelLayout ────────────────────────────────────────────────────────

/// Maps `(device slot, pin pair)` to a global channel index.
///
/// Only opened devices have slots, so channel indices are contiguous:
/// `channel_count() == devices * pairs_per_device`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLayout {
    devices: usize,
    pairs_per_device: usize,
}

impl ChannelLayout {
    pub fn new(devices: usize, pairs_per_device: usize) -> Self {
        Self {
            devices,
            pairs_per_device,
        }
    }

    pub fn devices(&self) -> usize {
        self.devices
    }

    pub fn pairs_per_device(&self) -> usize {
        self.pairs_per_device
    }

    pub fn channel_count(&self) -> usize {
        self.devices * self.pairs_per_device
    }

    pub fn channel_index(&self, device: usize, pair: usize) -> usize {
        device * self.pairs_per_device + pair
    }

    /// Global channel indices belonging to `device`.
    pub fn channels_of(&self, device: usize) -> Range<usize> {
        let first = self.channel_index(device, 0);
        first..first + self.pairs_per_device
    }
}
