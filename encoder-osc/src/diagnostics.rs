//! Human-readable diagnostic lines logged by the publisher.

use core::fmt::Write;

/// Width of the position bar, in characters.
pub const BAR_WIDTH: usize = 20;

/// The 16 snapshot bits as `'0'`/`'1'`, pin 0 first.
pub fn binary_string(snapshot: u16) -> String {
    (0..16)
        .map(|bit| if snapshot & (1 << bit) != 0 { '1' } else { '0' })
        .collect()
}

/// A fixed-width bar that cycles with the position.
///
/// `(position + 1) mod 20` stars (non-negative remainder), padded with
/// spaces, so position −1 shows an empty bar and 0 a single star.
pub fn bar(position: i32) -> String {
    let stars = (i64::from(position) + 1).rem_euclid(BAR_WIDTH as i64) as usize;
    let mut bar = "*".repeat(stars);
    bar.push_str(&" ".repeat(BAR_WIDTH - stars));
    bar
}

/// `[m] <bits>: ` followed by `%4d <bar>` for every channel of the device.
pub fn device_line(device: usize, snapshot: u16, positions: &[i32]) -> String {
    let mut line = format!("[{device}] {}: ", binary_string(snapshot));
    for &position in positions {
        let _ = write!(line, "{position:4} {}", bar(position));
    }
    line
}

/// `[m] <bits>` for a snapshot change that moved no channel.
pub fn snapshot_line(device: usize, snapshot: u16) -> String {
    format!("[{device}] {}", binary_string(snapshot))
}
