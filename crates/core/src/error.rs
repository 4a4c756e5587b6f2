//! Error types for the market-profile system.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the market-profile system.
///
/// Structural errors abort only the analysis unit (one instrument or window)
/// they were raised for. Bars that span no grid level are not errors; they are
/// recorded as skipped contributions by the footprint decomposer.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed price range or non-positive tick / bin specification.
    #[error("Invalid range: {0}")]
    InvalidRange(String),

    /// Histogram with zero total activity, so there is no point of control.
    #[error("Empty histogram: total activity is zero")]
    EmptyHistogram,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data error (invalid or missing record fields).
    #[error("Data error: {0}")]
    Data(String),

    /// Failure reported by the market-data collaborator.
    #[error("Source error: {0}")]
    Source(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid range error.
    pub fn invalid_range(msg: impl Into<String>) -> Self {
        Error::InvalidRange(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data error.
    pub fn data(msg: impl Into<String>) -> Self {
        Error::Data(msg.into())
    }

    /// Create a source error.
    pub fn source(msg: impl Into<String>) -> Self {
        Error::Source(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_range("high 1 < low 2");
        assert_eq!(err.to_string(), "Invalid range: high 1 < low 2");
        assert_eq!(
            Error::EmptyHistogram.to_string(),
            "Empty histogram: total activity is zero"
        );
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: Error = parse.unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
    }
}
