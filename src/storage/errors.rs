//! Storage error types

use thiserror::Error;

use crate::partition::RelationId;
use crate::tuple::PhysicalLocator;

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Storage errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("relation {0:?} does not exist")]
    UnknownRelation(RelationId),

    #[error("locator {0} names no row version")]
    InvalidLocator(PhysicalLocator),

    #[error("row version at {0} was modified by another writer")]
    WriteConflict(PhysicalLocator),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::InvalidLocator(PhysicalLocator::new(RelationId(2), 9));
        assert!(err.to_string().contains("(2, 9)"));
    }
}
