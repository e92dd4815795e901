//! Partition error types

use thiserror::Error;

/// Result type for partition operations
pub type PartitionResult<T> = Result<T, PartitionError>;

/// Partition errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PartitionError {
    #[error("partition key column {0:?} is missing from the row")]
    KeyColumnMissing(String),

    #[error("partition key column {column:?} holds a non-integer value: {value}")]
    KeyTypeMismatch { column: String, value: String },
}
