//! Persistence snapshots of the whole working set.
//!
//! A snapshot is the shape the storage layer reads and writes: every
//! collection in order, with integer identities preserved so soft
//! references stay valid across a save/load cycle.

use crate::appointment::Appointment;
use crate::keyword::Keyword;
use crate::patient::Patient;
use crate::vaccination::VaxType;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use vms_core::IdData;

/// Errors that can occur while encoding or decoding a snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },
}

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u8 = 1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    /// Format version for compatibility.
    pub version: u8,
    pub patients: Vec<IdData<Patient>>,
    pub vax_types: Vec<VaxType>,
    pub appointments: Vec<IdData<Appointment>>,
    #[serde(default)]
    pub keywords: Vec<IdData<Keyword>>,
}

impl ModelSnapshot {
    pub fn new(
        patients: Vec<IdData<Patient>>,
        vax_types: Vec<VaxType>,
        appointments: Vec<IdData<Appointment>>,
        keywords: Vec<IdData<Keyword>>,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            patients,
            vax_types,
            appointments,
            keywords,
        }
    }

    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| SnapshotError::SerializationError(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: ModelSnapshot = serde_json::from_str(json)
            .map_err(|e| SnapshotError::SerializationError(e.to_string()))?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                actual: snapshot.version,
            });
        }

        Ok(snapshot)
    }
}

impl Default for ModelSnapshot {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new(), Vec::new())
    }
}
