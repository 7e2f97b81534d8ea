//! Error types for prober configuration.
//!
//! Channel failures are not wrapped here: they surface as the channel's own
//! [`Channel::Error`](crate::Channel::Error) and reach the caller untouched.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while building or loading a [`ProbeConfig`](crate::ProbeConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("min_delay {min:?} exceeds max_delay {max:?}")]
    InvertedBounds { min: Duration, max: Duration },

    #[error("invalid probe configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to read probe configuration {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
