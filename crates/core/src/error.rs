//! Error types for the valuation engine.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the valuation engine.
///
/// Only [`Error::Config`] and [`Error::Json`] ever reach callers of the public
/// analysis and profit operations. Parse and insufficient-data errors are
/// handled where they occur: the record is dropped or the statistic falls back
/// to its neutral default.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (invalid settings or unknown scenario type).
    #[error("Configuration error: {0}")]
    Config(String),

    /// A single raw record could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Sample too small for a statistic.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    /// Create an insufficient data error.
    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        Error::InsufficientData(msg.into())
    }

    /// Whether this error must be surfaced to the caller rather than degraded.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Config(_) | Error::Json(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("unknown scenario: PSA 8");
        assert_eq!(err.to_string(), "Configuration error: unknown scenario: PSA 8");
    }

    #[test]
    fn test_fatality() {
        assert!(Error::config("x").is_fatal());
        assert!(!Error::parse("bad price").is_fatal());
        assert!(!Error::insufficient_data("need 4 rows").is_fatal());
    }
}
