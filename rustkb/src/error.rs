//! Error types for rustkb

use thiserror::Error;

/// rustkb error type
#[derive(Error, Debug)]
pub enum Error {
    /// Store used before `initialize()` completed
    #[error("store not initialized: call initialize() before using the store")]
    NotInitialized,

    /// Underlying storage error
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid search query
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// A record failed insert-time validation
    #[error("validation error: {0}")]
    Validation(String),

    /// A remote fetch failed or returned an unusable payload
    #[error("fetch error: {0}")]
    Fetch(String),

    /// A Cargo manifest could not be parsed
    #[error("manifest error: {0}")]
    Manifest(String),
}

/// Result type alias for rustkb operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Fetch(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Manifest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::Validation("title must not be empty".to_string());
        assert_eq!(err.to_string(), "validation error: title must not be empty");
    }

    #[test]
    fn test_not_initialized_display() {
        let err = Error::NotInitialized;
        assert!(err.to_string().contains("initialize()"));
    }
}
