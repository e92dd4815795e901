//! Trigger error types

use thiserror::Error;

/// Result type for trigger invocations
pub type TriggerResult<T> = Result<T, TriggerError>;

/// Trigger errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TriggerError {
    #[error("trigger {name:?} failed: {reason}")]
    Failed { name: String, reason: String },
}

impl TriggerError {
    /// Creates a failure for a named trigger.
    pub fn failed(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Failed {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
