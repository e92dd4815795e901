//! Storage contract consumed by the relocation protocol
//!
//! The router never implements MVCC itself; it participates in the
//! storage layer's existing lock/delete protocol through `TupleStore`
//! and reacts to the outcomes the store reports. `heap` provides the
//! in-memory reference store the test suites run against.

mod errors;
pub mod heap;

pub use errors::{StorageError, StorageResult};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::tuple::PhysicalLocator;

/// Transaction identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Command identity within a transaction.
///
/// Each statement of a transaction runs under its own command id;
/// self-conflict detection compares these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CommandId(pub u32);

/// Transaction isolation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IsolationLevel {
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

impl IsolationLevel {
    /// Whether the level reads from a single transaction snapshot.
    ///
    /// Under a snapshot level a concurrent conflict cannot be resolved
    /// by re-checking the newer version; it is a serialization failure.
    pub fn uses_snapshot(&self) -> bool {
        matches!(self, Self::RepeatableRead | Self::Serializable)
    }
}

/// Row lock strength for the in-place UPDATE path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockMode {
    /// UPDATE touches key columns
    Exclusive,
    /// UPDATE leaves key columns alone
    NoKeyExclusive,
}

/// How a delete is flagged at the storage level.
///
/// Partition-migration deletes are distinguished so storage-side
/// bookkeeping can tell "row gone" from "row moved elsewhere".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteKind {
    Plain,
    ChangingPartition,
}

/// What the store reports for a lock or delete attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The operation succeeded
    Ok,
    /// The version was already modified by this same transaction; the
    /// command id of that modification is reported for the caller's
    /// self-conflict policy
    SelfModified { command: CommandId },
    /// A concurrent transaction modified the version first. If it was an
    /// update, `replacement` names the successor version; if a delete,
    /// there is no replacement
    Conflict {
        replacement: Option<PhysicalLocator>,
        writer: TransactionId,
    },
    /// The version is not visible to this transaction at all
    Invisible,
}

/// Physical tuple lock/delete primitives.
pub trait TupleStore {
    /// Locks the row version at `locator` to establish a write-conflict
    /// barrier without modifying it.
    fn lock_row(
        &mut self,
        locator: PhysicalLocator,
        command: CommandId,
        mode: LockMode,
    ) -> StorageResult<MutationOutcome>;

    /// Deletes the row version at `locator`, flagged per `kind`.
    fn delete_row(
        &mut self,
        locator: PhysicalLocator,
        command: CommandId,
        kind: DeleteKind,
    ) -> StorageResult<MutationOutcome>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_levels() {
        assert!(!IsolationLevel::ReadCommitted.uses_snapshot());
        assert!(IsolationLevel::RepeatableRead.uses_snapshot());
        assert!(IsolationLevel::Serializable.uses_snapshot());
    }

    #[test]
    fn test_isolation_serde_names() {
        assert_eq!(
            serde_json::to_string(&IsolationLevel::ReadCommitted).unwrap(),
            "\"read_committed\""
        );
    }
}
