//! Monotonic clock and sleep primitive used by the prober.
//!
//! The prober never calls `std::thread::sleep` or `Instant::now` directly; it
//! goes through [`Timer`] so that tests can substitute a clock that does not
//! actually block.

use std::time::{Duration, Instant};

/// Monotonic timestamps plus a best-effort sleep.
pub trait Timer {
    /// Time elapsed since an arbitrary fixed origin. Never goes backwards.
    fn now(&self) -> Duration;

    /// Blocks the calling thread for at least roughly `duration`.
    ///
    /// Oversleep is expected; callers measure the real elapsed time with
    /// [`now`](Timer::now).
    fn sleep(&self, duration: Duration);
}

impl<T: Timer + ?Sized> Timer for &T {
    #[inline]
    fn now(&self) -> Duration {
        (**self).now()
    }

    #[inline]
    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// [`Timer`] backed by [`Instant`] and [`std::thread::sleep`].
#[derive(Debug, Clone, Copy)]
pub struct SystemTimer {
    origin: Instant,
}

impl SystemTimer {
    /// Creates a timer whose origin is the current instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for SystemTimer {
    #[inline]
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    #[inline]
    fn sleep(&self, duration: Duration) {
        // Zero-length sleeps only yield.
        if duration.is_zero() {
            std::thread::yield_now();
        } else {
            std::thread::sleep(duration);
        }
    }
}

/// Whole nanoseconds in `d`, saturating at `u64::MAX`.
pub(crate) fn saturating_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}

/// Whole microseconds in `d`, saturating at `u64::MAX`.
pub(crate) fn saturating_micros(d: Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_timer_is_monotonic() {
        let t = SystemTimer::new();
        let a = t.now();
        t.sleep(Duration::from_micros(50));
        let b = t.now();
        assert!(b >= a + Duration::from_micros(50));
    }

    #[test]
    fn conversions_saturate_instead_of_truncating() {
        assert_eq!(saturating_nanos(Duration::from_micros(3)), 3_000);
        assert_eq!(saturating_nanos(Duration::MAX), u64::MAX);
        assert_eq!(saturating_micros(Duration::from_millis(2)), 2_000);
        assert_eq!(saturating_micros(Duration::MAX), u64::MAX);
    }

    #[test]
    fn zero_sleep_returns() {
        let t = SystemTimer::default();
        t.sleep(Duration::ZERO);
    }
}
