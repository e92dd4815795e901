//! In-memory row projection

use serde_json::{Map, Value};

use super::PhysicalLocator;

/// One row as produced by the UPDATE's subplan.
///
/// Column values are a JSON object, in the same shape the rest of the
/// system stores documents. The locator is hidden metadata, not a user
/// column: it names the physical version the row was projected from and
/// is present whenever the source is an ordinary storage-backed
/// partition.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Map<String, Value>,
    locator: Option<PhysicalLocator>,
}

impl Row {
    /// Creates a row with no hidden metadata (e.g. a constructed row).
    pub fn new(columns: Map<String, Value>) -> Self {
        Self {
            columns,
            locator: None,
        }
    }

    /// Creates a row carrying the locator of its source version.
    pub fn with_locator(columns: Map<String, Value>, locator: PhysicalLocator) -> Self {
        Self {
            columns,
            locator: Some(locator),
        }
    }

    /// Returns the hidden locator, if the row has one.
    pub fn locator(&self) -> Option<PhysicalLocator> {
        self.locator
    }

    /// Returns a column value.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column)
    }

    /// Sets a column value.
    pub fn set(&mut self, column: impl Into<String>, value: Value) {
        self.columns.insert(column.into(), value);
    }

    /// Borrows all column values.
    pub fn columns(&self) -> &Map<String, Value> {
        &self.columns
    }

    /// Consumes the row, returning its column values.
    pub fn into_columns(self) -> Map<String, Value> {
        self.columns
    }
}
