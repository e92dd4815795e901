//! Tuple relocation protocol
//!
//! Given one candidate row and the locator of its source version, decide
//! whether the row stays in its partition (lock it) or relocates (fire
//! triggers, delete it). Concurrent conflicts are resolved by the EPQ
//! retry loop; the loop is bounded only by how many writers interleave,
//! each iteration either converges or exits.

use crate::observability::Logger;
use crate::partition::{MembershipPredicate, ResultRelation};
use crate::storage::{DeleteKind, MutationOutcome};
use crate::trigger::{BeforeRowOutcome, TriggerEvent};
use crate::tuple::{PhysicalLocator, Row};

use super::errors::{RouterError, RouterResult};
use super::ExecContext;

/// What the protocol decided for a row.
#[derive(Debug, Clone, PartialEq)]
pub enum LockOrDelete {
    /// Row still belongs to the source partition; its version is locked
    /// and the statement proceeds as an in-place UPDATE
    Keep(Row),
    /// Row was deleted from the source partition and must be inserted
    /// into its destination
    Relocate(Row),
    /// Row vanished (suppressed by a trigger, concurrently deleted, or
    /// already handled by this statement); nothing to forward
    Gone,
}

/// Locks or deletes the source version of `row`.
///
/// The row's *updated* values decide the path: still inside the source
/// bounds means lock-and-keep, outside means trigger replay and a
/// partition-migration delete. Both paths share the conflict handling:
/// serialization failure under snapshot isolation, EPQ re-check and
/// retry under read committed, and the self-conflict policy for rows
/// this statement already touched.
pub fn lock_or_delete(
    cx: &mut ExecContext<'_>,
    relation: &ResultRelation,
    membership: &MembershipPredicate,
    mut row: Row,
    mut locator: PhysicalLocator,
) -> RouterResult<LockOrDelete> {
    let lock_mode = relation.update_lock_mode();

    loop {
        // Does the updated row still belong to the source partition?
        let relocating = !membership.matches(&row)?;

        let outcome = if relocating {
            // The statement is nominally an UPDATE, so UPDATE triggers
            // fire first even though the physical operation is a delete
            if relation.triggers.update_before_row {
                match cx
                    .triggers
                    .fire_before_row(TriggerEvent::Update, relation.id, &row)?
                {
                    BeforeRowOutcome::Proceed => {}
                    BeforeRowOutcome::Replace(rewritten) => row = rewritten,
                    BeforeRowOutcome::Suppress => return Ok(LockOrDelete::Gone),
                }
            }

            if relation.triggers.delete_before_row {
                match cx
                    .triggers
                    .fire_before_row(TriggerEvent::Delete, relation.id, &row)?
                {
                    // A delete trigger has no replacement row to offer
                    BeforeRowOutcome::Proceed | BeforeRowOutcome::Replace(_) => {}
                    BeforeRowOutcome::Suppress => return Ok(LockOrDelete::Gone),
                }
            }

            cx.store
                .delete_row(locator, cx.command, DeleteKind::ChangingPartition)?
        } else {
            cx.store.lock_row(locator, cx.command, lock_mode)?
        };

        match outcome {
            MutationOutcome::Ok => {
                if relocating {
                    Logger::info(
                        "ROUTER_RELOCATE",
                        &[
                            ("locator", &locator.to_string()),
                            ("relation", &relation.name),
                        ],
                    );
                    if relation.triggers.delete_after_row {
                        cx.triggers
                            .fire_after_row(TriggerEvent::Delete, relation.id, &row)?;
                    }
                    return Ok(LockOrDelete::Relocate(row));
                }
                return Ok(LockOrDelete::Keep(row));
            }

            MutationOutcome::SelfModified { command } => {
                // Deleted earlier by this very statement's relocation
                // path: a silent skip. Any other command of the same
                // transaction means a trigger propagated changes back
                // into this row mid-statement.
                if command != cx.command {
                    return Err(RouterError::SelfModification);
                }
                return Ok(LockOrDelete::Gone);
            }

            MutationOutcome::Conflict {
                replacement,
                writer,
            } => {
                if cx.isolation.uses_snapshot() {
                    return Err(RouterError::SerializationFailure);
                }

                // Concurrent delete leaves nothing to retry against
                let Some(new_locator) = replacement else {
                    return Ok(LockOrDelete::Gone);
                };

                match cx.epq.recheck(new_locator)? {
                    Some(substitute) => {
                        Logger::trace(
                            "ROUTER_EPQ_RETRY",
                            &[
                                ("locator", &new_locator.to_string()),
                                ("writer", &writer.to_string()),
                            ],
                        );
                        row = substitute;
                        locator = new_locator;
                    }
                    None => return Ok(LockOrDelete::Gone),
                }
            }

            MutationOutcome::Invisible => return Err(RouterError::InvisibleRow(locator)),
        }
    }
}
