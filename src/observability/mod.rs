//! Observability for the router
//!
//! Structured, synchronous, deterministic logging. Observability is
//! read-only: nothing here affects execution, and there are no
//! background threads or buffers.

mod logger;

pub use logger::{Logger, Severity};
