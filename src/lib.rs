//! partroute - cross-partition row relocation for UPDATE execution
//!
//! When an UPDATE changes a row's partition key, the row must move: the
//! executor deletes it from its source partition and re-injects it for
//! insertion into the destination, while keeping the statement's trigger
//! order, concurrent-modification handling, and self-update protection
//! identical to what a plain UPDATE or DELETE+INSERT would produce. This
//! crate is that relocation core: the router node, its relocation
//! protocol, and the driver loop adapter that lets one in-flight row
//! switch operations.

pub mod executor;
pub mod observability;
pub mod partition;
pub mod plan;
pub mod storage;
pub mod trigger;
pub mod tuple;
