//! Queue configuration.
//!
//! Defaults match the historical 100-slot buffer. The environment can
//! override them:
//!
//! - `KEYQUEUE_CAPACITY` - slot count (usable capacity is one less)
//! - `KEYQUEUE_LOG_KEYS` - log a description of every key event

use crate::error::QueueError;
use crate::queue::{DEFAULT_CAPACITY, MAX_CAPACITY, MIN_CAPACITY};

pub const ENV_CAPACITY: &str = "KEYQUEUE_CAPACITY";
pub const ENV_LOG_KEYS: &str = "KEYQUEUE_LOG_KEYS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    /// Slots to allocate, including the one that is always kept free.
    pub capacity: usize,
    /// Emit a debug line per key event seen by a source.
    pub log_keys: bool,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            log_keys: false,
        }
    }
}

impl QueueConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, QueueError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, QueueError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_CAPACITY) {
            config.capacity = raw.trim().parse().map_err(|_| QueueError::Config {
                key: ENV_CAPACITY,
                value: raw.clone(),
            })?;
        }

        if let Some(raw) = lookup(ENV_LOG_KEYS) {
            config.log_keys = parse_flag(&raw).ok_or_else(|| QueueError::Config {
                key: ENV_LOG_KEYS,
                value: raw.clone(),
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), QueueError> {
        if self.capacity < MIN_CAPACITY {
            return Err(QueueError::InvalidCapacity {
                capacity: self.capacity,
                min: MIN_CAPACITY,
            });
        }
        if self.capacity > MAX_CAPACITY {
            return Err(QueueError::CapacityTooLarge {
                capacity: self.capacity,
                max: MAX_CAPACITY,
            });
        }
        Ok(())
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
