//! Demonstration of adaptive probing versus a plain blocking wait.
//!
//! Two threads share an in-process [`Mailbox`]. The sender posts a fixed-size
//! message at a regular interval; the receiver probes for each message
//! (adaptive, or pass-through with `--disable`), then receives it. Half of
//! the messages go through `probe` + `recv`, the other half through a
//! non-blocking receive finished by `complete`, and every step is logged with
//! the prober's last delay and accumulated sleep.
//!
//! ```text
//! RUST_LOG=info eeprobe-demo --messages 12 --interval-ms 200
//! RUST_LOG=info eeprobe-demo --messages 12 --interval-ms 200 --disable
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use eeprobe::{Mailbox, Mode, Operation, Prober, ProbeConfig};
use tracing::info;
use tracing_subscriber::prelude::*;

const SENDER: u32 = 0;
const TAG: u32 = 0;

#[derive(Parser, Debug)]
#[command(name = "eeprobe-demo", about = "Compare adaptive probing with a blocking wait")]
struct Cli {
    /// Number of messages exchanged
    #[arg(long, default_value_t = 24)]
    messages: u32,
    /// Pause between two messages, in milliseconds
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,
    /// Payload size in bytes
    #[arg(long, default_value_t = 1024)]
    size: usize,
    /// Wait with the channel's blocking call instead of adaptive probing
    #[arg(long)]
    disable: bool,
    /// TOML file with min_delay_ns / max_delay_ns / increment_ns
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_thread_ids(true))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ProbeConfig::from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ProbeConfig::default(),
    };
    let mode = if cli.disable {
        Mode::PassThrough
    } else {
        Mode::Adaptive
    };

    let mailbox = Arc::new(Mailbox::new());
    let start = Instant::now();

    let sender = {
        let mailbox = Arc::clone(&mailbox);
        let (count, size) = (cli.messages, cli.size);
        let interval = Duration::from_millis(cli.interval_ms);
        thread::Builder::new()
            .name("sender".into())
            .spawn(move || -> Result<()> {
                for i in 0..count {
                    mailbox.post(SENDER, TAG, vec![0; size])?;
                    info!(elapsed_us = elapsed_us(start), i, "send");
                    thread::sleep(interval);
                }
                Ok(())
            })?
    };

    receive(&mailbox, config, mode, cli.messages, start)?;

    sender
        .join()
        .map_err(|_| anyhow::anyhow!("sender thread panicked"))??;
    Ok(())
}

fn elapsed_us(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX)
}

fn receive(
    mailbox: &Mailbox,
    config: ProbeConfig,
    mode: Mode,
    count: u32,
    start: Instant,
) -> Result<()> {
    let mut prober = Prober::new(config);
    info!(
        ?mode,
        min_delay = ?config.min_delay(),
        max_delay = ?config.max_delay(),
        increment = ?config.increment(),
        "receiver ready"
    );

    let half = count / 2;
    for i in 0..count {
        let via = if i < half {
            prober.probe(mailbox, SENDER, TAG, mode)?;
            mailbox.recv(SENDER, TAG)?;
            "probe+recv"
        } else {
            let mut request = mailbox.irecv(SENDER, TAG);
            prober.complete(&mut request, Operation::Recv, mode)?;
            request
                .into_message()
                .context("receive completed without a message")?;
            "irecv+complete"
        };
        info!(
            elapsed_us = elapsed_us(start),
            i,
            via,
            last_delay = ?prober.last_delay(),
            total_sleep = ?prober.total_sleep_time(),
            "recv"
        );
    }

    info!("{}", prober.ledger());
    Ok(())
}
