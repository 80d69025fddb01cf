//! # Widget Model Errors
//!
//! Errors raised by the persistence boundary, lifecycle hooks and slug
//! generation. They are request-scoped: a failed save is reported to its
//! caller and never retried by the kernel.
use thiserror::Error;

use crate::model::lifecycle::LifecyclePhase;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// A uniqueness constraint failed at write time, typically after a slug lookup passed.
    #[error("Unique constraint violated on {table}.{column} for value {value}")]
    PersistenceRace {
        table: String,
        column: String,
        value: String,
    },

    #[error("No row in '{table}' matches {key}")]
    NotFound { table: String, key: String },

    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A lifecycle hook vetoed the operation.
    #[error("{phase} hook rejected the operation: {message}")]
    Hook {
        phase: LifecyclePhase,
        message: String,
    },

    #[error("Slug generation failed: {0}")]
    Slug(String),
}

impl ModelError {
    /// Veto raised from inside a hook for `phase`
    pub fn hook(phase: LifecyclePhase, message: impl Into<String>) -> Self {
        ModelError::Hook {
            phase,
            message: message.into(),
        }
    }
}
