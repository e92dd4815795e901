//! Row trigger contract
//!
//! The router does not invoke trigger functions itself; it replays the
//! firing order an ordinary UPDATE or DELETE would produce through this
//! contract. For a relocating row that order is:
//!
//! 1. BEFORE UPDATE row triggers (the statement is nominally an UPDATE)
//! 2. BEFORE DELETE row triggers
//! 3. physical delete
//! 4. AFTER DELETE row triggers
//!
//! BEFORE INSERT / AFTER INSERT fire later, inside the destination
//! partition's insert path, outside this crate.

mod errors;

pub use errors::{TriggerError, TriggerResult};

use serde::{Deserialize, Serialize};

use crate::partition::RelationId;
use crate::tuple::Row;

/// Row-level trigger events the router fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerEvent {
    Update,
    Delete,
}

/// When a trigger fires relative to the row operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriggerTiming {
    Before,
    After,
}

/// What a BEFORE ROW trigger decided.
#[derive(Debug, Clone, PartialEq)]
pub enum BeforeRowOutcome {
    /// Continue with the row as-is
    Proceed,
    /// Continue with a rewritten row
    Replace(Row),
    /// Skip the row entirely
    Suppress,
}

/// The trigger subsystem as seen by the relocation protocol.
pub trait TriggerSet {
    /// Fires BEFORE ROW triggers for the event. The returned outcome may
    /// rewrite or suppress the row.
    fn fire_before_row(
        &mut self,
        event: TriggerEvent,
        relation: RelationId,
        row: &Row,
    ) -> TriggerResult<BeforeRowOutcome>;

    /// Fires AFTER ROW triggers for the event. Notification only.
    fn fire_after_row(
        &mut self,
        event: TriggerEvent,
        relation: RelationId,
        row: &Row,
    ) -> TriggerResult<()>;
}

/// A trigger set with nothing defined. Every call is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTriggers;

impl TriggerSet for NoTriggers {
    fn fire_before_row(
        &mut self,
        _event: TriggerEvent,
        _relation: RelationId,
        _row: &Row,
    ) -> TriggerResult<BeforeRowOutcome> {
        Ok(BeforeRowOutcome::Proceed)
    }

    fn fire_after_row(
        &mut self,
        _event: TriggerEvent,
        _relation: RelationId,
        _row: &Row,
    ) -> TriggerResult<()> {
        Ok(())
    }
}
