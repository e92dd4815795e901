//! Plan re-qualification after a concurrent conflict
//!
//! When the store reports that a concurrent transaction replaced the row
//! version the router was about to lock or delete, the statement's
//! qualification must be re-run against the replacement before the
//! protocol may continue with it.

use crate::tuple::{PhysicalLocator, Row};

use super::errors::RouterResult;

/// EPQ re-check contract.
pub trait QualRecheck {
    /// Re-runs the subplan's per-row qualification against the version
    /// at `locator`. Returns the substitute row (projection applied,
    /// locator attached) if the new version still qualifies, `None` if
    /// it no longer does.
    fn recheck(&mut self, locator: PhysicalLocator) -> RouterResult<Option<Row>>;
}
