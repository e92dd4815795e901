//! Router error types
//!
//! Taxonomy:
//! - `LocatorMissing` / `UnsupportedRelationKind` - fatal, the statement
//!   aborts (broken upstream contract, no recovery)
//! - `SerializationFailure` - retryable transaction error; the caller
//!   decides whether to retry the whole transaction
//! - `SelfModification` - same-statement integrity violation
//! - transient concurrent conflicts never surface here; they are
//!   absorbed by the EPQ retry loop

use thiserror::Error;

use crate::partition::{PartitionError, RelationKind};
use crate::storage::StorageError;
use crate::trigger::TriggerError;
use crate::tuple::PhysicalLocator;

/// Result type for router operations
pub type RouterResult<T> = Result<T, RouterError>;

/// Router errors
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RouterError {
    #[error("row produced by the subplan carries no physical locator")]
    LocatorMissing,

    #[error("partition router does not support {kind:?} relation {name:?}")]
    UnsupportedRelationKind { name: String, kind: RelationKind },

    #[error("could not serialize access due to concurrent update")]
    SerializationFailure,

    #[error("row was already modified by an operation triggered by the current command")]
    SelfModification,

    #[error("attempted to lock invisible row version at {0}")]
    InvisibleRow(PhysicalLocator),

    #[error("restarted dispatch yielded another restart instead of the saved row")]
    RestartLoop,

    #[error(transparent)]
    Partition(#[from] PartitionError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Trigger(#[from] TriggerError),
}
