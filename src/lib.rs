//! # eeprobe 🌿
//!
//! Energy-efficient probing for message-passing programs.
//!
//! A process that waits for a message by calling a non-blocking "is it
//! ready?" test in a tight loop burns a full core while doing nothing. This
//! crate swaps that busy-wait for an **adaptive backoff poll**: the same test,
//! with a short sleep between unsuccessful checks that grows linearly up to a
//! cap. Receipt latency goes up a little; wasted polling goes down a lot.
//!
//! The crate includes:
//!
//! - [`Prober`] — the adaptive backoff loop and its sleep accounting.
//! - [`BackOff`] — the linear, capped working delay of one probe call.
//! - [`ProbeConfig`] — validated `min_delay` / `max_delay` / `increment`.
//! - [`Channel`] / [`Request`] — what the prober polls.
//! - [`SleepLedger`] — cumulative sleep per [`Operation`] kind.
//! - [`Mailbox`] — an in-process channel for demos and tests.
//!
//! ## ✨ Features
//!
//! - ✅ Runs on the caller's thread; spawns nothing
//! - ⚙️ Linear growth, hard cap, reset at the start of every call
//! - ⏱️ Accounts *measured* sleep, not requested sleep
//! - 🧪 Clock and sleep behind [`Timer`], so the loop is testable without waiting
//! - 🔀 [`Mode::PassThrough`] baseline that delegates to the blocking wait
//!
//! ## 🚀 Quick Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//! use eeprobe::{Mailbox, Mode, Prober, ProbeConfig};
//!
//! let mailbox = Arc::new(Mailbox::new());
//!
//! let sender = {
//!     let mailbox = Arc::clone(&mailbox);
//!     thread::spawn(move || mailbox.post(0, 0, vec![1, 2, 3]).unwrap())
//! };
//!
//! let mut prober = Prober::new(ProbeConfig::default());
//! prober.probe(&*mailbox, 0, 0, Mode::Adaptive).unwrap();
//! let message = mailbox.recv(0, 0).unwrap();
//! assert_eq!(message.payload, vec![1, 2, 3]);
//!
//! sender.join().unwrap();
//! println!("slept {:?}, last delay {:?}", prober.total_sleep_time(), prober.last_delay());
//! ```
//!
//! ## 🧠 Design
//!
//! ### Prober
//!
//! Each adaptive call starts a fresh [`BackOff`] at `min_delay`. On every
//! unsuccessful readiness test the prober timestamps, sleeps the working
//! delay, timestamps again and adds the difference to its ledger; the delay
//! then grows by `increment`, clamped to `max_delay`. When the test succeeds
//! the delay of the final sleep is kept as [`Prober::last_delay`].
//!
//! ### Errors
//!
//! Bad bounds are rejected when a [`ProbeConfig`] is built. Channel errors
//! are never interpreted: they come back from [`Prober::probe`] exactly as
//! the channel produced them.
//!
//! ## ⚠️ Usage Notes
//!
//! - `probe` only detects readiness; receive the message afterwards.
//! - A prober serves one polling site; calls take `&mut self`.
//! - A sleeping call cannot be cancelled.
//!
//! ## 📦 Modules
//!
//! - [`backoff`] — Linear capped working delay.
//! - [`channel`] — Channel and request capabilities.
//! - [`config`] — Backoff bounds and TOML loading.
//! - [`error`] — Configuration errors.
//! - [`ledger`] — Per-operation sleep accounting.
//! - [`mailbox`] — In-process channel.
//! - [`prober`] — The adaptive backoff prober.
//! - [`timer`] — Clock and sleep abstraction.

pub mod backoff;
pub mod channel;
pub mod config;
pub mod error;
pub mod ledger;
pub mod mailbox;
pub mod prober;
pub mod timer;

pub use backoff::BackOff;
pub use channel::{Channel, Request};
pub use config::{ProbeConfig, ProbeConfigBuilder};
pub use error::ConfigError;
pub use ledger::{Operation, SleepLedger};
pub use mailbox::{Mailbox, MailboxError, Message, RecvRequest, ANY_SOURCE, ANY_TAG};
pub use prober::{Attempt, Mode, Prober};
pub use timer::{SystemTimer, Timer};
