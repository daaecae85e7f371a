use super::types::{Polarity, Rotation};

/// Position of each 2-bit `(a << 1) | b` state along the clockwise cycle
/// `00 → 10 → 11 → 01 → 00`.
const CYCLE_INDEX: [u8; 4] = [0, 3, 1, 2];

/// Quarter steps in one full quadrature cycle.
pub const STEPS_PER_CYCLE: u8 = 4;

/// Table-driven quadrature decoder with a free-running signed position.
///
/// Every sample is compared with the previous one:
///
/// - one channel changed in the clockwise order: +1 quarter step,
/// - one channel changed in the counter-clockwise order: −1 quarter step,
/// - both channels changed at once: the transition is ambiguous and ignored
///   (counted in [`skipped`](Self::skipped)),
/// - nothing changed: ignored.
///
/// Quarter steps accumulate until they reach `steps_per_count`, then the
/// position moves by one. Contact bounce on a single channel produces
/// alternating ±1 quarter steps that cancel out, so it never reaches the
/// position. The default of 4 quarter steps per count gives one count per
/// detent on common mechanical encoders.
///
/// The position has no bounds. It only changes inside
/// [`process`](crate::Decode::process).
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QuadratureDecoder {
    polarity: Polarity,
    steps_per_count: u8,
    state: u8,
    quarter_steps: i8,
    position: i32,
    skipped: u32,
}

impl Default for QuadratureDecoder {
    fn default() -> Self {
        Self::new(Polarity::default())
    }
}

impl QuadratureDecoder {
    /// Decoder at position 0 counting one step per full cycle.
    ///
    /// The idle state is both channels inactive.
    pub fn new(polarity: Polarity) -> Self {
        Self {
            polarity,
            steps_per_count: STEPS_PER_CYCLE,
            state: 0,
            quarter_steps: 0,
            position: 0,
            skipped: 0,
        }
    }

    /// Change how many quarter steps make one count (1 = full 4x
    /// resolution). Values outside `1..=4` are clamped.
    pub fn with_steps_per_count(mut self, steps: u8) -> Self {
        self.steps_per_count = steps.clamp(1, STEPS_PER_CYCLE);
        self
    }

    pub fn polarity(&self) -> Polarity {
        self.polarity
    }

    pub fn steps_per_count(&self) -> u8 {
        self.steps_per_count
    }

    /// Number of ambiguous (both-channel) transitions ignored so far.
    pub fn skipped(&self) -> u32 {
        self.skipped
    }

    fn encode(&self, a: bool, b: bool) -> u8 {
        let (a, b) = match self.polarity {
            Polarity::ActiveHigh => (a, b),
            Polarity::ActiveLow => (!a, !b),
        };
        (u8::from(a) << 1) | u8::from(b)
    }
}

impl crate::Decode for QuadratureDecoder {
    fn process(&mut self, a: bool, b: bool) -> Rotation {
        let next = self.encode(a, b);
        let previous = core::mem::replace(&mut self.state, next);

        let distance = (CYCLE_INDEX[next as usize] + 4 - CYCLE_INDEX[previous as usize]) % 4;
        match distance {
            0 => return Rotation::None,
            1 => self.quarter_steps += 1,
            3 => self.quarter_steps -= 1,
            _ => {
                self.skipped = self.skipped.wrapping_add(1);
                return Rotation::None;
            }
        }

        let steps = self.steps_per_count as i8;
        if self.quarter_steps >= steps {
            self.quarter_steps -= steps;
            self.position = self.position.wrapping_add(1);
            Rotation::Clockwise
        } else if self.quarter_steps <= -steps {
            self.quarter_steps += steps;
            self.position = self.position.wrapping_sub(1);
            Rotation::CounterClockwise
        } else {
            Rotation::None
        }
    }

    fn position(&self) -> i32 {
        self.position
    }
}
