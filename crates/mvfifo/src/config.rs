//! Construction-time configuration

use std::env;

use crate::error::{Error, Result};

/// Default size ceiling (256 MiB)
pub const DEFAULT_MAX_SIZE_BYTES: usize = 256 << 20;

/// Environment variable read by [`CacheConfig::from_env`]
pub const MAX_SIZE_ENV: &str = "MVFIFO_MAX_SIZE_BYTES";

/// Options applied once when a cache is built
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    max_size_bytes: usize,
}

impl CacheConfig {
    /// Config with all defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the size ceiling in bytes. Negative values clamp to 0.
    pub fn max_size_bytes(mut self, bytes: i64) -> Self {
        self.max_size_bytes = usize::try_from(bytes.max(0)).unwrap_or(usize::MAX);
        self
    }

    /// Configured size ceiling in bytes
    pub fn max_size(&self) -> usize {
        self.max_size_bytes
    }

    /// Load config from the environment.
    ///
    /// # Environment Variables
    /// - `MVFIFO_MAX_SIZE_BYTES` - Size ceiling in bytes, clamped to 0 (default: 256 MiB)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(raw) = lookup(MAX_SIZE_ENV) {
            let bytes = raw.trim().parse::<i64>().map_err(|_| Error::InvalidConfig {
                key: MAX_SIZE_ENV.to_string(),
                value: raw.clone(),
            })?;
            config = config.max_size_bytes(bytes);
        }
        Ok(config)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_SIZE_BYTES,
        }
    }
}
