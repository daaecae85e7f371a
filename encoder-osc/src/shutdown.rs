//! Cooperative shutdown.
//!
//! The signal handler does nothing but flip a [`CancellationToken`]; both
//! loops check it once per iteration and return on their own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Cancel `token` on SIGINT or SIGTERM.
///
/// Can only be installed once per process.
pub fn cancel_on_signal(token: &CancellationToken) -> Result<(), ctrlc::Error> {
    let token = token.clone();
    ctrlc::set_handler(move || token.cancel())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_starts_live() {
        assert!(!CancellationToken::new().is_cancelled());
    }

    #[test]
    fn clones_share_cancellation() {
        let token = CancellationToken::new();
        let other = token.clone();
        other.cancel();
        assert!(token.is_cancelled());
        // Idempotent.
        token.cancel();
        assert!(other.is_cancelled());
    }

    #[test]
    fn cancel_is_seen_across_threads() {
        let token = CancellationToken::new();
        let remote = token.clone();
        std::thread::spawn(move || remote.cancel()).join().unwrap();
        assert!(token.is_cancelled());
    }
}
