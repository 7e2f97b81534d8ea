//! # BackOff
//!
//! The working delay of a single adaptive probe call.
//!
//! Each unsuccessful readiness test sleeps for the current delay, then the
//! delay grows by a fixed increment until it reaches the configured cap.
//! A fresh [`BackOff`] is created for every probe call, so the delay always
//! starts again from the configured minimum.
//!
//! ## Features
//! - ⚙️ **Linear growth** by `increment` per step
//! - 🧱 **Hard cap** at `max_delay`
//! - 🧩 **Configurable bounds** via [`ProbeConfig`]
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use eeprobe::{BackOff, ProbeConfig};
//!
//! let config = ProbeConfig::new(
//!     Duration::from_nanos(10),
//!     Duration::from_nanos(12),
//!     Duration::from_nanos(5),
//! ).unwrap();
//!
//! let backoff = BackOff::new(&config);
//! assert_eq!(backoff.current(), Duration::from_nanos(10));
//! backoff.advance();
//! assert_eq!(backoff.current(), Duration::from_nanos(12));
//! backoff.advance();
//! assert_eq!(backoff.current(), Duration::from_nanos(12));
//! ```
//!
//! ## Behavior
//! - After `k` calls to [`BackOff::advance`] the delay is
//!   `min(min_delay + k * increment, max_delay)`.
//! - A zero increment degenerates to fixed-interval polling at `min_delay`.

use core::cell::Cell;
use std::time::Duration;

use crate::config::ProbeConfig;
use crate::timer::Timer;

/// Linear, capped backoff delay.
///
/// Holds its delay in a [`Cell`], which keeps the type `!Sync`: one working
/// delay belongs to one polling site at a time.
#[derive(Debug)]
pub struct BackOff {
    delay: Cell<Duration>,
    max: Duration,
    step: Duration,
}

impl BackOff {
    /// Creates a [`BackOff`] positioned at `config.min_delay()`.
    #[inline]
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            delay: Cell::new(config.min_delay()),
            max: config.max_delay(),
            step: config.increment(),
        }
    }

    /// Returns the delay the next sleep will use.
    #[inline(always)]
    pub fn current(&self) -> Duration {
        self.delay.get()
    }

    /// Grows the delay by one increment, clamped to the cap.
    #[inline]
    pub fn advance(&self) {
        let next = self.delay.get().saturating_add(self.step).min(self.max);
        self.delay.set(next);
    }

    /// Sleeps for the current delay through `timer`, then advances.
    ///
    /// Returns the delay that was requested for this step.
    #[inline]
    pub fn wait<T: Timer + ?Sized>(&self, timer: &T) -> Duration {
        let delay = self.current();
        timer.sleep(delay);
        self.advance();
        delay
    }
}
