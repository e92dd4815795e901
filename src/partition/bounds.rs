//! Partition bounds and the compiled membership predicate
//!
//! The membership predicate answers one question for the router: does a
//! row, in its updated form, still fall inside the source partition's
//! bounds? It is compiled once per source partition and evaluated per
//! row, the same compile-once/evaluate-many shape the planner uses for
//! its boundedness analysis.

use serde::{Deserialize, Serialize};

use crate::tuple::Row;

use super::errors::{PartitionError, PartitionResult};

/// The key range a range-partition accepts: `lower <= key < upper`.
///
/// A `None` bound is unbounded on that side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionBounds {
    /// Partitioning key column
    pub column: String,
    /// Inclusive lower bound
    pub lower: Option<i64>,
    /// Exclusive upper bound
    pub upper: Option<i64>,
}

impl PartitionBounds {
    /// Creates range bounds over an integer key column.
    pub fn range(column: impl Into<String>, lower: Option<i64>, upper: Option<i64>) -> Self {
        Self {
            column: column.into(),
            lower,
            upper,
        }
    }

    /// Whether a key value falls inside the bounds.
    pub fn contains(&self, key: i64) -> bool {
        if let Some(lower) = self.lower {
            if key < lower {
                return false;
            }
        }
        if let Some(upper) = self.upper {
            if key >= upper {
                return false;
            }
        }
        true
    }
}

/// Compiled membership check for one source partition.
///
/// Built lazily on the first row the router processes and cached until
/// rescan.
#[derive(Debug, Clone, PartialEq)]
pub struct MembershipPredicate {
    bounds: PartitionBounds,
}

impl MembershipPredicate {
    /// Compiles the predicate from the partition's bounds.
    pub fn compile(bounds: &PartitionBounds) -> Self {
        Self {
            bounds: bounds.clone(),
        }
    }

    /// Evaluates the predicate against a row's updated values.
    ///
    /// Returns an error if the key column is absent or non-integer; the
    /// subplan projection guarantees neither happens for well-formed
    /// plans, so callers surface this as a statement failure.
    pub fn matches(&self, row: &Row) -> PartitionResult<bool> {
        let value = row
            .get(&self.bounds.column)
            .ok_or_else(|| PartitionError::KeyColumnMissing(self.bounds.column.clone()))?;

        let key = value
            .as_i64()
            .ok_or_else(|| PartitionError::KeyTypeMismatch {
                column: self.bounds.column.clone(),
                value: value.to_string(),
            })?;

        Ok(self.bounds.contains(key))
    }
}
