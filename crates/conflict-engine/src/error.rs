//! Error types for conflict-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConflictError {
    /// Malformed day, time, date, recurrence, or kind value on input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced session, room, teacher, or group id is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unexpected collaborator failure (e.g. the session store is unavailable).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConflictError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        ConflictError::Validation(msg.into())
    }

    pub(crate) fn not_found(id: impl std::fmt::Display) -> Self {
        ConflictError::NotFound(id.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConflictError>;
