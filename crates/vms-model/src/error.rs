//! Error types for the model layer.

use crate::snapshot::SnapshotError;
use thiserror::Error;
use vms_core::StoreError;

/// Errors that can occur in model operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] SnapshotError),
}

impl ModelError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ModelError::Store(StoreError::NotFound(_)))
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, ModelError::Store(StoreError::DuplicateEntity(_)))
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, ModelError::Store(StoreError::InvalidValue(_)))
    }
}

pub type Result<T> = std::result::Result<T, ModelError>;
