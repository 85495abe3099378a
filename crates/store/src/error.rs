//! Store operation errors.
//!
//! These are infrastructure errors (uniqueness, connectivity, corrupted
//! state) as opposed to domain errors (validation, invariants).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique key is already taken by another record.
    #[error("duplicate {field}: {value}")]
    Duplicate { field: &'static str, value: String },

    /// The database rejected or failed an operation.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The backend itself is unusable (poisoned lock, closed pool).
    #[error("store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn duplicate(field: &'static str, value: impl Into<String>) -> Self {
        Self::Duplicate {
            field,
            value: value.into(),
        }
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}
