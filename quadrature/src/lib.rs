//! Quadrature rotary-encoder decoding.
//!
//! A rotary encoder drives two square waves 90° out of phase. Which channel
//! leads gives the direction, and the number of edges gives the distance.
//! This crate turns a stream of sampled `(a, b)` levels into a signed
//! position.
//!
//! The [`Decode`] trait is the seam between pin sampling and decoding:
//! the sampling side only ever calls [`Decode::process`] and
//! [`Decode::position`], so the counting rule is owned entirely by the
//! decoder. [`QuadratureDecoder`] is the table-driven implementation.
//!
//! # `no_std` Compatibility
//!
//! No heap allocation. The optional `defmt` feature adds
//! [`defmt::Format`] implementations.

#![cfg_attr(not(test), no_std)]

mod decoder;
mod types;

pub use decoder::{QuadratureDecoder, STEPS_PER_CYCLE};
pub use types::{Polarity, Rotation};

/// A decoder turning two pin levels into a position.
pub trait Decode {
    /// Feed the current levels of channel A and channel B.
    ///
    /// Returns the position change caused by this sample, if any.
    fn process(&mut self, a: bool, b: bool) -> Rotation;

    /// Current position.
    fn position(&self) -> i32;
}
