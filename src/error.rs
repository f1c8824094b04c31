//! Error taxonomy shared by the store, the modal machine and the dispatcher.
//!
//! Every user-facing failure is one of four kinds. Validation and constraint
//! failures abort the operation; not-found leaves state untouched; persistence
//! failures are reported generically and never partially commit.

use crate::storage::StorageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TodoError {
    /// Malformed input: empty name/title, bad number, out-of-range panel count
    #[error("{0}")]
    Validation(String),
    /// Unknown role, task or panel
    #[error("{0}")]
    NotFound(String),
    /// A rule of the data model would be broken
    #[error("{0}")]
    Constraint(String),
    #[error("Storage unavailable: {0}")]
    Persistence(#[from] StorageError),
}

/// Discriminant of [`TodoError`], handy for assertions and styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Constraint,
    Persistence,
}

impl TodoError {
    pub fn validation(msg: impl Into<String>) -> Self {
        TodoError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        TodoError::NotFound(msg.into())
    }

    pub fn constraint(msg: impl Into<String>) -> Self {
        TodoError::Constraint(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TodoError::Validation(_) => ErrorKind::Validation,
            TodoError::NotFound(_) => ErrorKind::NotFound,
            TodoError::Constraint(_) => ErrorKind::Constraint,
            TodoError::Persistence(_) => ErrorKind::Persistence,
        }
    }
}

pub type Result<T> = std::result::Result<T, TodoError>;
