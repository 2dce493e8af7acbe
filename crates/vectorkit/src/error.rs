//! Error types for vectorkit

use thiserror::Error;

/// Result type alias for vectorkit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for configuration and structural checks
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Attempt to add a key to a frozen configuration
    #[error("Frozen structure: cannot add new key '{key}'")]
    FrozenStructure {
        /// Key that was rejected
        key: String,
    },

    /// A structural assertion failed
    #[error("Check failed: {0}")]
    Check(String),

    /// Settings could not be parsed
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub(crate) fn check(msg: impl Into<String>) -> Self {
        Error::Check(msg.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::InvalidConfig(err.to_string())
    }
}
