//! Error types shared by every store.

use thiserror::Error;

/// Errors raised by identity maps, storage models and read-only views.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate entity: {0}")]
    DuplicateEntity(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Operation not supported: {0}")]
    Unsupported(String),
}

impl StoreError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        StoreError::NotFound(what.to_string())
    }

    pub fn duplicate(what: impl std::fmt::Display) -> Self {
        StoreError::DuplicateEntity(what.to_string())
    }

    pub fn invalid(what: impl Into<String>) -> Self {
        StoreError::InvalidValue(what.into())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
