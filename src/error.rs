//! Structural errors raised by the aggregation engine.
//!
//! Per-row data problems (absent values, zero denominators, unparseable
//! numerics) never surface here; they are excluded locally by each operation.

use thiserror::Error;

/// Errors an analysis can fail with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The operation needs at least one row.
    #[error("{operation}: dataset is empty")]
    EmptyDataset { operation: &'static str },

    /// No aggregate "World" location is present.
    #[error("{operation}: no rows with location \"World\" in dataset")]
    NoWorldRow { operation: &'static str },

    /// A requested column is not part of the row schema.
    #[error("{operation}: column '{column}' does not exist")]
    MissingColumn {
        operation: &'static str,
        column: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_operation() {
        let err = AnalysisError::EmptyDataset {
            operation: "null_audit",
        };
        assert_eq!(err.to_string(), "null_audit: dataset is empty");

        let err = AnalysisError::MissingColumn {
            operation: "null_audit",
            column: "vaccinations".to_string(),
        };
        assert!(err.to_string().contains("vaccinations"));
        assert!(err.to_string().starts_with("null_audit"));
    }
}
