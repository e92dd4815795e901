//! Modification driver loop and restart adapter
//!
//! The generic driver pulls rows from its plan step and dispatches them
//! under its current operation. The router redirects single rows to a
//! different operation mid-iteration; the adapter here consumes the
//! typed `RouterVerdict::Restart`, restores the driver's iteration
//! state, and immediately re-dispatches so the saved row flows through
//! the new operation's plan step.

use serde::{Deserialize, Serialize};

use crate::partition::RelationId;
use crate::tuple::Row;

use super::errors::{RouterError, RouterResult};
use super::router::{Router, RouterVerdict};
use super::ExecContext;

/// Operation the driver is currently performing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CmdKind {
    /// Ordinary in-place update of the active result relation
    Update,
    /// Insert of an already-deleted row into its destination partition
    Insert,
}

impl CmdKind {
    /// Operation name for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            CmdKind::Update => "UPDATE",
            CmdKind::Insert => "INSERT",
        }
    }
}

/// Mutable driver state the router is permitted to steer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverState {
    /// Current operation rows are dispatched under
    pub operation: CmdKind,
    /// Result relation the current operation targets
    pub active_relation: RelationId,
    /// Plan step currently being executed
    pub which_step: usize,
    /// Total plan steps
    pub n_steps: usize,
    /// Whether iteration has finished
    pub done: bool,
}

impl DriverState {
    pub fn new(operation: CmdKind, active_relation: RelationId, n_steps: usize) -> Self {
        Self {
            operation,
            active_relation,
            which_step: 0,
            n_steps,
            done: false,
        }
    }
}

/// Downstream write dispatch. The embedding executor supplies this; it
/// owns destination routing and the insert path's trigger firing.
pub trait OperationDispatch {
    /// Applies an in-place UPDATE to the active result relation.
    fn update_in_place(&mut self, relation: RelationId, row: &Row) -> RouterResult<()>;

    /// Inserts a relocated row into whichever partition accepts it.
    fn insert_routed(&mut self, row: &Row) -> RouterResult<()>;
}

/// The driver's pull-and-dispatch loop with restart interception.
pub struct DriverLoop<'a, D: OperationDispatch> {
    router: Router,
    state: DriverState,
    dispatch: &'a mut D,
}

impl<'a, D: OperationDispatch> DriverLoop<'a, D> {
    pub fn new(router: Router, state: DriverState, dispatch: &'a mut D) -> Self {
        Self {
            router,
            state,
            dispatch,
        }
    }

    /// Current driver state (operation, step, done flag).
    pub fn state(&self) -> &DriverState {
        &self.state
    }

    /// Executes one pull-and-dispatch cycle. Returns `false` once the
    /// subplan is exhausted.
    pub fn step(&mut self, cx: &mut ExecContext<'_>) -> RouterResult<bool> {
        if self.state.done {
            return Ok(false);
        }

        match self.router.process_next(cx, &mut self.state)? {
            RouterVerdict::Drained => {
                self.state.done = true;
                Ok(false)
            }
            RouterVerdict::Forward(row) => {
                self.dispatch_row(&row)?;
                Ok(true)
            }
            RouterVerdict::Restart { operation, step } => {
                // Restore the iteration state the router asked for, then
                // re-invoke the pull so the saved row is dispatched under
                // the new operation
                self.state.done = false;
                self.state.operation = operation;
                self.state.which_step = step;

                match self.router.process_next(cx, &mut self.state)? {
                    RouterVerdict::Forward(row) => {
                        self.dispatch_row(&row)?;
                        Ok(true)
                    }
                    RouterVerdict::Drained => {
                        self.state.done = true;
                        Ok(false)
                    }
                    // The saved row is forwarded without re-validation,
                    // so a second restart in a row cannot happen
                    RouterVerdict::Restart { .. } => Err(RouterError::RestartLoop),
                }
            }
        }
    }

    /// Runs the loop until the subplan is exhausted; returns how many
    /// rows were dispatched.
    pub fn run_to_completion(&mut self, cx: &mut ExecContext<'_>) -> RouterResult<u64> {
        let mut dispatched = 0;
        while self.step(cx)? {
            dispatched += 1;
        }
        Ok(dispatched)
    }

    /// Rescans the node: iteration state and the router reset together.
    pub fn rescan(&mut self) -> RouterResult<()> {
        self.state.done = false;
        self.state.which_step = 0;
        self.router.rescan()
    }

    fn dispatch_row(&mut self, row: &Row) -> RouterResult<()> {
        match self.state.operation {
            CmdKind::Update => self
                .dispatch
                .update_in_place(self.state.active_relation, row),
            CmdKind::Insert => self.dispatch.insert_routed(row),
        }
    }
}
