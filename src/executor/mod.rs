//! Partition router execution core
//!
//! The router is spliced between an UPDATE's subplan and the generic
//! modification driver. Per row it decides whether the updated values
//! still belong to the source partition: if yes, the row is locked and
//! forwarded as an ordinary in-place UPDATE; if no, it is deleted from
//! the source (with UPDATE-then-DELETE trigger replay) and forwarded for
//! insertion into its destination partition.
//!
//! Execution flow per pulled row:
//! 1. Drain the saved row if one is buffered (already validated)
//! 2. Extract the hidden physical locator
//! 3. Force the driver's active result relation to the source partition
//! 4. Run the lock-or-delete protocol (EPQ retry loop inside)
//! 5. Forward, or signal a typed restart when the pending operation
//!    differs from the driver's current one

mod driver;
mod epq;
mod errors;
mod relocate;
mod router;

pub use driver::{CmdKind, DriverLoop, DriverState, OperationDispatch};
pub use epq::QualRecheck;
pub use errors::{RouterError, RouterResult};
pub use relocate::{lock_or_delete, LockOrDelete};
pub use router::{Router, RouterVerdict, RowSource};

use crate::storage::{CommandId, IsolationLevel, TupleStore};
use crate::trigger::TriggerSet;

/// Per-statement execution context: the collaborators the router and the
/// relocation protocol act through, plus the statement's identity.
pub struct ExecContext<'a> {
    /// Physical tuple lock/delete primitives
    pub store: &'a mut dyn TupleStore,
    /// Trigger subsystem
    pub triggers: &'a mut dyn TriggerSet,
    /// Plan re-qualification after a concurrent conflict
    pub epq: &'a mut dyn QualRecheck,
    /// Command id of the statement being executed
    pub command: CommandId,
    /// Isolation level the statement runs under
    pub isolation: IsolationLevel,
}

impl<'a> ExecContext<'a> {
    pub fn new(
        store: &'a mut dyn TupleStore,
        triggers: &'a mut dyn TriggerSet,
        epq: &'a mut dyn QualRecheck,
        command: CommandId,
        isolation: IsolationLevel,
    ) -> Self {
        Self {
            store,
            triggers,
            epq,
            command,
            isolation,
        }
    }
}
