/// Which pin level counts as "active".
///
/// Inverting both channels does not change the direction of rotation, only
/// which levels the decoder treats as the idle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// A high level is active.
    #[default]
    ActiveHigh,
    /// A low level is active (switch to ground with a pull-up).
    ActiveLow,
}

/// Outcome of feeding one sample to a decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    /// No complete step; the position is unchanged.
    None,
    /// Position incremented by one (channel A leading).
    Clockwise,
    /// Position decremented by one (channel B leading).
    CounterClockwise,
}

impl Rotation {
    /// Signed position change: `+1`, `-1` or `0`.
    pub fn delta(self) -> i32 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise => 1,
            Rotation::CounterClockwise => -1,
        }
    }
}
