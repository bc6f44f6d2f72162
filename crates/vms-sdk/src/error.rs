//! Error types for the VMS SDK.

use std::fmt;
use vms_model::{ModelError, SnapshotError, StoreError};

/// Error type for SDK operations.
#[derive(Clone, Debug, PartialEq)]
pub enum SdkError {
    /// Entity not found.
    NotFound(String),
    /// Entity already exists.
    Duplicate(String),
    /// Value rejected by validation.
    InvalidValue(String),
    /// Operation not supported on this handle.
    Unsupported(String),
    /// Snapshot could not be decoded or installed.
    Snapshot(String),
}

impl fmt::Display for SdkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SdkError::NotFound(e) => write!(f, "Not found: {}", e),
            SdkError::Duplicate(e) => write!(f, "Duplicate entity: {}", e),
            SdkError::InvalidValue(e) => write!(f, "Invalid value: {}", e),
            SdkError::Unsupported(e) => write!(f, "Unsupported operation: {}", e),
            SdkError::Snapshot(e) => write!(f, "Snapshot error: {}", e),
        }
    }
}

impl std::error::Error for SdkError {}

impl From<StoreError> for SdkError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(e) => SdkError::NotFound(e),
            StoreError::DuplicateEntity(e) => SdkError::Duplicate(e),
            StoreError::InvalidValue(e) => SdkError::InvalidValue(e),
            StoreError::Unsupported(e) => SdkError::Unsupported(e),
        }
    }
}

impl From<SnapshotError> for SdkError {
    fn from(err: SnapshotError) -> Self {
        SdkError::Snapshot(err.to_string())
    }
}

impl From<ModelError> for SdkError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::Store(e) => e.into(),
            ModelError::Snapshot(e) => e.into(),
        }
    }
}

/// Result type for SDK operations.
pub type Result<T> = std::result::Result<T, SdkError>;
