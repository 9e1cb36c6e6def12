//! Error types for agm-integrate
//!
//! Data problems (malformed lines, catalog outages, unmapped keys) are counted
//! and logged, never raised. What remains here stops a run.

use thiserror::Error;

/// Integration stage error type
#[derive(Debug, Error)]
pub enum IntegrationError {
    /// A table row disagrees with the header discovered in the first pass.
    /// This is a bug in the projector, not a data problem.
    #[error("Schema inconsistency for record '{record_id}': header has {expected} columns, row has {found}")]
    SchemaInconsistency {
        record_id: String,
        expected: usize,
        found: usize,
    },

    /// Two fixed columns were configured with the same external header
    #[error("Duplicate column header '{header}'")]
    DuplicateColumn { header: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer error
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// JSON encode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// agm-common error
    #[error(transparent)]
    Common(#[from] agm_common::Error),
}

/// Result type for the integration stage
pub type IntegrationResult<T> = Result<T, IntegrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_error_displays_without_wrapper_prefix() {
        let err = IntegrationError::from(agm_common::Error::InvalidInput("no 'id' column".to_string()));
        assert_eq!(err.to_string(), "Invalid input: no 'id' column");
    }
}
