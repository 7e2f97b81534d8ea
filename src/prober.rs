//! # Prober
//!
//! Adaptive backoff replacement for busy-wait message probing.
//!
//! A receiver that spins on a non-blocking "is a message ready?" test keeps a
//! core at full power while doing nothing useful. [`Prober::probe`] runs the
//! same test, but sleeps between unsuccessful checks with a delay that grows
//! linearly from `min_delay` up to `max_delay`. Every sleep is measured with
//! the prober's [`Timer`] and accumulated, so callers can see how much time
//! was given back to the system.
//!
//! ## State
//!
//! A prober is `Idle` between calls. An adaptive call moves it to `Polling`
//! for the duration of the call, with a working delay that starts at
//! `min_delay` every time; it returns to `Idle` when the readiness test
//! succeeds (or the channel reports an error). [`Mode::PassThrough`] never
//! enters `Polling`: it hands the wait to the channel's blocking call and
//! leaves all counters untouched.
//!
//! ## Example
//! ```rust
//! use eeprobe::{Mailbox, Mode, Prober, ProbeConfig};
//!
//! let mailbox = Mailbox::new();
//! mailbox.post(0, 7, b"hello".to_vec()).unwrap();
//!
//! let mut prober = Prober::new(ProbeConfig::default());
//! prober.probe(&mailbox, 0, 7, Mode::Adaptive).unwrap();
//! assert_eq!(mailbox.take(0, 7).unwrap().payload, b"hello");
//! ```
//!
//! ## Usage notes
//! - `probe` detects readiness only; the caller receives the message.
//! - Calls take `&mut self`: one call completes before the next begins.
//! - There is no cancellation. Bound the wait externally if needed.

use std::time::Duration;

use tracing::{debug, trace};

use crate::backoff::BackOff;
use crate::channel::{Channel, Request};
use crate::config::ProbeConfig;
use crate::ledger::{Operation, SleepLedger};
use crate::timer::{saturating_micros, saturating_nanos, SystemTimer, Timer};

/// How a probe call waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Poll with growing sleeps between tests.
    #[default]
    Adaptive,
    /// Delegate to the channel's blocking wait. Used as a baseline.
    PassThrough,
}

/// One unsuccessful iteration of an adaptive call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attempt {
    /// Delay requested from the timer.
    pub delay: Duration,
    /// Time that actually passed, as measured by the timer's clock.
    pub elapsed: Duration,
}

/// Adaptive backoff prober.
///
/// Generic over its [`Timer`] so tests can run the loop against a fake clock.
#[derive(Debug)]
pub struct Prober<T: Timer = SystemTimer> {
    config: ProbeConfig,
    timer: T,
    last_delay: Duration,
    ledger: SleepLedger,
}

impl Prober<SystemTimer> {
    /// Creates a prober that really sleeps.
    pub fn new(config: ProbeConfig) -> Self {
        Self::with_timer(config, SystemTimer::new())
    }
}

impl Default for Prober<SystemTimer> {
    fn default() -> Self {
        Self::new(ProbeConfig::default())
    }
}

impl<T: Timer> Prober<T> {
    /// Creates a prober that sleeps and reads time through `timer`.
    pub fn with_timer(config: ProbeConfig, timer: T) -> Self {
        Self {
            last_delay: config.min_delay(),
            config,
            timer,
            ledger: SleepLedger::new(),
        }
    }

    /// Waits until `channel` reports a message for `(source, tag)`.
    ///
    /// The message is not consumed. Channel errors are returned unchanged;
    /// sleep performed before the error stays accounted.
    pub fn probe<C: Channel + ?Sized>(
        &mut self,
        channel: &C,
        source: C::Source,
        tag: C::Tag,
        mode: Mode,
    ) -> Result<(), C::Error> {
        self.probe_observed(channel, source, tag, mode, |_| {})
    }

    /// Like [`probe`](Self::probe), reporting every unsuccessful iteration to
    /// `observe` as it happens.
    pub fn probe_observed<C, F>(
        &mut self,
        channel: &C,
        source: C::Source,
        tag: C::Tag,
        mode: Mode,
        observe: F,
    ) -> Result<(), C::Error>
    where
        C: Channel + ?Sized,
        F: FnMut(Attempt),
    {
        match mode {
            Mode::PassThrough => channel.wait_ready(source, tag),
            Mode::Adaptive => self.poll(
                Operation::Probe,
                || channel.test_ready(source, tag),
                observe,
            ),
        }
    }

    /// Waits for an already-started non-blocking operation to finish.
    ///
    /// Sleep time is attributed to `op` (`Wait` for a plain wait, `Recv` for
    /// a receive, the collective's kind otherwise).
    pub fn complete<R: Request + ?Sized>(
        &mut self,
        request: &mut R,
        op: Operation,
        mode: Mode,
    ) -> Result<(), R::Error> {
        self.complete_observed(request, op, mode, |_| {})
    }

    /// Like [`complete`](Self::complete), reporting every unsuccessful
    /// iteration to `observe`.
    pub fn complete_observed<R, F>(
        &mut self,
        request: &mut R,
        op: Operation,
        mode: Mode,
        observe: F,
    ) -> Result<(), R::Error>
    where
        R: Request + ?Sized,
        F: FnMut(Attempt),
    {
        match mode {
            Mode::PassThrough => request.wait(),
            Mode::Adaptive => self.poll(op, || request.test(), observe),
        }
    }

    /// Delay used by the final sleep of the last adaptive call, or
    /// `min_delay` if that call never slept.
    #[inline]
    pub fn last_delay(&self) -> Duration {
        self.last_delay
    }

    /// Cumulative measured sleep across all calls and operation kinds.
    #[inline]
    pub fn total_sleep_time(&self) -> Duration {
        self.ledger.total()
    }

    /// Cumulative measured sleep attributed to `op`.
    #[inline]
    pub fn total_sleep_time_for(&self, op: Operation) -> Duration {
        self.ledger.get(op)
    }

    /// Per-operation sleep counters.
    #[inline]
    pub fn ledger(&self) -> &SleepLedger {
        &self.ledger
    }

    /// Bounds this prober was built with.
    #[inline]
    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// Clock and sleep used by the polling loop.
    #[inline]
    pub fn timer(&self) -> &T {
        &self.timer
    }

    fn poll<E, R, F>(&mut self, op: Operation, mut ready: R, mut observe: F) -> Result<(), E>
    where
        R: FnMut() -> Result<bool, E>,
        F: FnMut(Attempt),
    {
        let mut polling = Polling::enter(&self.config);

        let outcome = loop {
            match ready() {
                Ok(true) => break Ok(()),
                Ok(false) => {}
                Err(err) => break Err(err),
            }
            let attempt = polling.step(&self.timer);
            self.ledger.record(op, attempt.elapsed);
            trace!(
                op = op.as_str(),
                delay_ns = saturating_nanos(attempt.delay),
                elapsed_ns = saturating_nanos(attempt.elapsed),
                "not ready, slept"
            );
            observe(attempt);
        };

        let sleeps = polling.sleeps;
        self.last_delay = polling.finish();
        debug!(
            op = op.as_str(),
            sleeps,
            ok = outcome.is_ok(),
            last_delay_ns = saturating_nanos(self.last_delay),
            total_sleep_us = saturating_micros(self.ledger.total()),
            "probe finished"
        );
        outcome
    }
}

/// Live state of one adaptive call.
struct Polling {
    backoff: BackOff,
    last: Duration,
    sleeps: u64,
}

impl Polling {
    fn enter(config: &ProbeConfig) -> Self {
        Self {
            backoff: BackOff::new(config),
            last: config.min_delay(),
            sleeps: 0,
        }
    }

    fn step<T: Timer>(&mut self, timer: &T) -> Attempt {
        let start = timer.now();
        let delay = self.backoff.wait(timer);
        let elapsed = timer.now().saturating_sub(start);
        self.last = delay;
        self.sleeps += 1;
        Attempt { delay, elapsed }
    }

    fn finish(self) -> Duration {
        self.last
    }
}
