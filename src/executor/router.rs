//! Router state machine
//!
//! One router instance serves one UPDATE statement. It owns the subplan
//! it pulls candidate rows from, the source partition's result relation
//! context, the lazily derived locator column and membership predicate,
//! and the single-row saved buffer used to re-deliver a row after the
//! driver restarts with a different operation.

use crate::observability::Logger;
use crate::partition::{MembershipPredicate, RelationKind, ResultRelation};
use crate::plan::RouterPlan;
use crate::tuple::{PhysicalLocator, Row};

use super::driver::{CmdKind, DriverState};
use super::errors::{RouterError, RouterResult};
use super::relocate::{lock_or_delete, LockOrDelete};
use super::ExecContext;

/// Upstream subplan contract: yields candidate rows in plan order.
pub trait RowSource {
    /// Produces the next row, or `None` when the subplan is exhausted.
    fn next_row(&mut self) -> RouterResult<Option<Row>>;

    /// Resets the subplan so iteration starts over.
    fn rescan(&mut self) -> RouterResult<()>;
}

/// What `process_next` tells the driver to do.
#[derive(Debug, Clone, PartialEq)]
pub enum RouterVerdict {
    /// Dispatch this row under the driver's current operation
    Forward(Row),
    /// The pending operation changed: switch to `operation`, reset the
    /// iteration to `step`, and pull again (the row is saved)
    Restart { operation: CmdKind, step: usize },
    /// Subplan exhausted
    Drained,
}

/// The hidden-column extractor, captured once from the source relation.
///
/// Capturing guards the relation kind: only ordinary partitions attach
/// locators to their rows.
#[derive(Debug, Clone)]
struct LocatorColumn {
    relation_name: String,
}

impl LocatorColumn {
    fn capture(relation: &ResultRelation) -> RouterResult<Self> {
        match relation.kind {
            RelationKind::Ordinary => Ok(Self {
                relation_name: relation.name.clone(),
            }),
            kind => Err(RouterError::UnsupportedRelationKind {
                name: relation.name.clone(),
                kind,
            }),
        }
    }

    fn extract(&self, row: &Row) -> RouterResult<PhysicalLocator> {
        row.locator().ok_or(RouterError::LocatorMissing)
    }
}

/// Lazily derived per-statement context.
#[derive(Debug, Clone)]
struct RouterContext {
    locator_column: LocatorColumn,
    membership: MembershipPredicate,
}

impl RouterContext {
    fn derive(relation: &ResultRelation) -> RouterResult<Self> {
        Ok(Self {
            locator_column: LocatorColumn::capture(relation)?,
            membership: MembershipPredicate::compile(&relation.bounds),
        })
    }
}

/// Router execution state for one statement.
pub struct Router {
    relation: ResultRelation,
    subplan: Box<dyn RowSource>,
    epq_param: u32,
    context: Option<RouterContext>,
    saved: Option<Row>,
}

impl Router {
    /// Instantiates the router node for a statement.
    pub fn new(plan: &RouterPlan, relation: ResultRelation, subplan: Box<dyn RowSource>) -> Self {
        Self {
            relation,
            subplan,
            epq_param: plan.epq_param,
            context: None,
            saved: None,
        }
    }

    /// The source partition this router deletes from.
    pub fn source_relation(&self) -> &ResultRelation {
        &self.relation
    }

    /// Pulls and processes one row.
    ///
    /// A saved row is forwarded as-is: it was validated before it was
    /// saved, and re-running the protocol would fire its triggers twice.
    /// A fresh row goes through locator extraction and the lock-or-delete
    /// protocol; rows that vanish under it are skipped and the next row
    /// is pulled.
    pub fn process_next(
        &mut self,
        cx: &mut ExecContext<'_>,
        driver: &mut DriverState,
    ) -> RouterResult<RouterVerdict> {
        loop {
            if let Some(row) = self.saved.take() {
                return Ok(RouterVerdict::Forward(row));
            }

            let Some(row) = self.subplan.next_row()? else {
                return Ok(RouterVerdict::Drained);
            };

            if self.context.is_none() {
                self.context = Some(RouterContext::derive(&self.relation)?);
            }
            let context = match &self.context {
                Some(context) => context,
                None => unreachable!("context derived above"),
            };
            let locator = context.locator_column.extract(&row)?;

            // The driver may have pointed its active result relation at a
            // destination partition for a previous row; the protocol must
            // run against the source partition
            driver.active_relation = self.relation.id;

            let (operation, row) =
                match lock_or_delete(cx, &self.relation, &context.membership, row, locator)? {
                    LockOrDelete::Gone => continue,
                    LockOrDelete::Keep(row) => (CmdKind::Update, row),
                    LockOrDelete::Relocate(row) => (CmdKind::Insert, row),
                };

            if operation == driver.operation {
                return Ok(RouterVerdict::Forward(row));
            }

            Logger::trace(
                "ROUTER_RESTART",
                &[
                    ("epq_param", &self.epq_param.to_string()),
                    ("operation", operation.as_str()),
                    ("step", &driver.which_step.to_string()),
                ],
            );
            self.saved = Some(row);
            return Ok(RouterVerdict::Restart {
                operation,
                step: driver.which_step,
            });
        }
    }

    /// Resets the node for a rescan: the subplan starts over, the saved
    /// row is dropped, and the lazy context is re-derived.
    pub fn rescan(&mut self) -> RouterResult<()> {
        self.subplan.rescan()?;
        self.saved = None;
        self.context = None;
        Ok(())
    }

}
