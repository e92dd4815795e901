//! Partition metadata and membership checking
//!
//! This module provides:
//! - `RelationId` / `RelationKind` - partition identity
//! - `PartitionBounds` - the key range a partition accepts
//! - `MembershipPredicate` - compiled bound check, built once per source
//!   partition and re-evaluated against each updated row
//! - `ResultRelation` - the open handle to the source partition shared
//!   with the relocation protocol

mod bounds;
mod errors;
mod relation;

pub use bounds::{MembershipPredicate, PartitionBounds};
pub use errors::{PartitionError, PartitionResult};
pub use relation::{RelationId, RelationKind, ResultRelation, TriggerFlags};
