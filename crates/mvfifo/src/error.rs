//! Error types for mvfifo
//!
//! Cache operations never fail; errors only come from loading configuration.

use std::fmt;

/// Result type alias for mvfifo operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for cache setup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A configuration value could not be parsed
    InvalidConfig {
        /// Name of the setting
        key: String,
        /// Raw value that was rejected
        value: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidConfig { key, value } => {
                write!(f, "Invalid config: {}={:?} is not an integer", key, value)
            }
        }
    }
}

impl std::error::Error for Error {}
