//! Common error types for AGM tooling

use thiserror::Error;

/// Common result type for AGM operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across AGM tools
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error (wraps serde_json::Error)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV read/write error (wraps csv::Error, which carries its own prefix)
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_error_message_not_double_prefixed() {
        let mut reader = csv::Reader::from_reader("a,b\n1\n".as_bytes());
        let csv_err = reader.records().next().unwrap().unwrap_err();

        let message = Error::from(csv_err).to_string();
        assert!(message.starts_with("CSV error: "));
        assert!(!message.contains("CSV error: CSV error"));
    }
}
