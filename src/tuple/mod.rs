//! Row and physical-locator types
//!
//! A `Row` is the in-memory projection of column values produced by the
//! UPDATE's subplan, plus the hidden physical locator the upstream
//! projection attaches for storage-backed sources. The locator is what
//! lets the relocation protocol lock or delete the exact on-disk version
//! the row was read from.

mod locator;
mod row;

pub use locator::PhysicalLocator;
pub use row::Row;
