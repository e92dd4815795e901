//! Result relation context

use serde::{Deserialize, Serialize};

use crate::storage::LockMode;

use super::PartitionBounds;

/// Stable identifier of a relation (partition).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationId(pub u32);

/// What kind of relation a partition is.
///
/// Only ordinary partitions carry physical locators; everything else is
/// rejected when the router captures its locator column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    /// Plain storage-backed partition
    Ordinary,
    /// Foreign-server partition (unsupported by the router)
    Foreign,
}

/// Which row triggers exist on a relation.
///
/// Mirrors the trigger descriptor of the open relation so the relocation
/// protocol can skip trigger calls entirely when none are defined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerFlags {
    pub update_before_row: bool,
    pub delete_before_row: bool,
    pub delete_after_row: bool,
}

impl TriggerFlags {
    /// Flags for a relation with no row triggers.
    pub fn none() -> Self {
        Self::default()
    }

    /// Flags for a relation with every trigger the router consults.
    pub fn all() -> Self {
        Self {
            update_before_row: true,
            delete_before_row: true,
            delete_after_row: true,
        }
    }
}

/// The open handle to the source partition of an UPDATE.
///
/// Captured once when the router node begins execution and shared
/// read-only with the relocation protocol for the statement's lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRelation {
    /// Relation identity
    pub id: RelationId,
    /// Relation name, for diagnostics
    pub name: String,
    /// Relation kind guard
    pub kind: RelationKind,
    /// Bounds this partition accepts
    pub bounds: PartitionBounds,
    /// Row triggers defined on the relation
    pub triggers: TriggerFlags,
    /// Lock mode an UPDATE takes on rows it keeps in place
    pub lock_mode: LockMode,
}

impl ResultRelation {
    /// Creates an ordinary partition handle with no triggers.
    pub fn ordinary(id: RelationId, name: impl Into<String>, bounds: PartitionBounds) -> Self {
        Self {
            id,
            name: name.into(),
            kind: RelationKind::Ordinary,
            bounds,
            triggers: TriggerFlags::none(),
            lock_mode: LockMode::Exclusive,
        }
    }

    /// Sets the relation's trigger descriptor flags.
    pub fn with_triggers(mut self, triggers: TriggerFlags) -> Self {
        self.triggers = triggers;
        self
    }

    /// Marks the relation as a foreign partition.
    pub fn foreign(mut self) -> Self {
        self.kind = RelationKind::Foreign;
        self
    }

    /// Lock mode for the in-place UPDATE path.
    pub fn update_lock_mode(&self) -> LockMode {
        self.lock_mode
    }
}
