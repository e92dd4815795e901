//! Physical row locators

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::partition::RelationId;

/// Identifies one physical row version inside its partition.
///
/// Locators are stable for the lifetime of the version they name: a
/// concurrent UPDATE produces a *new* version with a *new* locator and
/// links the old one to it, it never reuses slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PhysicalLocator {
    /// Partition holding the version
    pub relation: RelationId,
    /// Slot index within the partition
    pub slot: u32,
}

impl PhysicalLocator {
    /// Creates a locator for the given partition slot.
    pub fn new(relation: RelationId, slot: u32) -> Self {
        Self { relation, slot }
    }
}

impl fmt::Display for PhysicalLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.relation.0, self.slot)
    }
}
