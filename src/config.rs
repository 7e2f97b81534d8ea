//! # ProbeConfig
//!
//! Construction-time bounds for the adaptive backoff loop.
//!
//! The recognised options are:
//!
//! | option      | meaning                                   | default  |
//! |-------------|-------------------------------------------|----------|
//! | `min_delay` | lower bound of the polling interval       | `0ns`    |
//! | `max_delay` | upper bound (cap) of the polling interval | `1000ns` |
//! | `increment` | growth step after each unsuccessful check | `1ns`    |
//!
//! A configuration is validated once, when it is built or loaded, so a
//! [`Prober`](crate::Prober) never sees inverted bounds.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use eeprobe::ProbeConfig;
//!
//! let config = ProbeConfig::builder()
//!     .min_delay(Duration::from_nanos(10))
//!     .max_delay(Duration::from_micros(50))
//!     .increment(Duration::from_nanos(100))
//!     .build()
//!     .unwrap();
//! assert_eq!(config.max_delay(), Duration::from_micros(50));
//!
//! let config = ProbeConfig::from_toml_str("max_delay_ns = 2000").unwrap();
//! assert_eq!(config.max_delay(), Duration::from_nanos(2000));
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::timer::saturating_nanos;

/// Default lower bound of the working delay.
pub const DEFAULT_MIN_DELAY: Duration = Duration::ZERO;

/// Default cap of the working delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_nanos(1000);

/// Default growth step per unsuccessful readiness test.
pub const DEFAULT_INCREMENT: Duration = Duration::from_nanos(1);

/// Validated backoff bounds.
///
/// Serialized with nanosecond integer fields (`min_delay_ns`, `max_delay_ns`,
/// `increment_ns`); missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawConfig", into = "RawConfig")]
pub struct ProbeConfig {
    min_delay: Duration,
    max_delay: Duration,
    increment: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            min_delay: DEFAULT_MIN_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            increment: DEFAULT_INCREMENT,
        }
    }
}

impl ProbeConfig {
    /// Creates a configuration, rejecting `min_delay > max_delay`.
    pub fn new(
        min_delay: Duration,
        max_delay: Duration,
        increment: Duration,
    ) -> Result<Self, ConfigError> {
        if min_delay > max_delay {
            return Err(ConfigError::InvertedBounds {
                min: min_delay,
                max: max_delay,
            });
        }
        Ok(Self {
            min_delay,
            max_delay,
            increment,
        })
    }

    /// Starts a builder seeded with the defaults.
    pub fn builder() -> ProbeConfigBuilder {
        ProbeConfigBuilder::default()
    }

    /// Parses a TOML document such as `min_delay_ns = 0\nmax_delay_ns = 1000`.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    /// Reads and parses a TOML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    /// Delay of the first sleep of every adaptive call.
    #[inline]
    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Cap the working delay never exceeds.
    #[inline]
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Growth of the working delay after each unsuccessful test.
    #[inline]
    pub fn increment(&self) -> Duration {
        self.increment
    }
}

/// Builder for [`ProbeConfig`]; validation happens in [`build`](Self::build).
#[derive(Debug, Clone, Copy, Default)]
pub struct ProbeConfigBuilder {
    config: ProbeConfig,
}

impl ProbeConfigBuilder {
    /// Sets the lower bound of the polling interval.
    pub fn min_delay(mut self, delay: Duration) -> Self {
        self.config.min_delay = delay;
        self
    }

    /// Sets the cap of the polling interval.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.config.max_delay = delay;
        self
    }

    /// Sets the growth step per unsuccessful check.
    pub fn increment(mut self, step: Duration) -> Self {
        self.config.increment = step;
        self
    }

    /// Validates the bounds and returns the configuration.
    pub fn build(self) -> Result<ProbeConfig, ConfigError> {
        let ProbeConfig {
            min_delay,
            max_delay,
            increment,
        } = self.config;
        ProbeConfig::new(min_delay, max_delay, increment)
    }
}

#[derive(Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    min_delay_ns: u64,
    max_delay_ns: u64,
    increment_ns: u64,
}

impl Default for RawConfig {
    fn default() -> Self {
        ProbeConfig::default().into()
    }
}

impl From<ProbeConfig> for RawConfig {
    fn from(config: ProbeConfig) -> Self {
        Self {
            min_delay_ns: saturating_nanos(config.min_delay),
            max_delay_ns: saturating_nanos(config.max_delay),
            increment_ns: saturating_nanos(config.increment),
        }
    }
}

impl TryFrom<RawConfig> for ProbeConfig {
    type Error = ConfigError;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        ProbeConfig::new(
            Duration::from_nanos(raw.min_delay_ns),
            Duration::from_nanos(raw.max_delay_ns),
            Duration::from_nanos(raw.increment_ns),
        )
    }
}
