//! # vms-model
//!
//! The vaccination-management working set: patients, vaccination types,
//! appointments and keywords, kept mutually consistent by one orchestrator.
//!
//! - [`ModelManager`] is the entry point. Every mutation routed through it
//!   is cascaded into the dependent collections, carried into the detail
//!   bindings and reflected in the filtered views before it returns.
//! - The managers ([`PatientManager`], [`VaxTypeManager`],
//!   [`AppointmentManager`], [`KeywordManager`]) can be built directly for
//!   bulk loading and then swapped in whole.
//! - [`ModelSnapshot`] is the persistence shape.
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use vms_model::{Appointment, BloodType, GroupName, ModelManager, Patient, VaxType};
//!
//! let mut model = ModelManager::new();
//! let flu = GroupName::new("Flu").unwrap();
//! model
//!     .add_vaccination(VaxType::builder(flu.clone()).age_range(5, 120).build().unwrap())
//!     .unwrap();
//!
//! let dob = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
//! let patient = Patient::new("Alex Yeoh", "87438807", dob, BloodType::APositive)
//!     .unwrap()
//!     .with_vaccines([flu.clone()]);
//! let id = model.add_patient(patient).unwrap().value().unwrap().id();
//!
//! let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
//! let end = start + chrono::Duration::minutes(30);
//! model.add_appointment(Appointment::new(id, flu.clone(), start, end).unwrap()).unwrap();
//!
//! // Removing the vaccination cascades into appointments and patients.
//! let committed = model.delete_vaccination(&flu).unwrap();
//! assert_eq!(committed.cascaded.len(), 2);
//! assert!(model.appointments().is_empty());
//! assert!(model.patients().get(id).unwrap().value().vaccines().is_empty());
//! ```

mod advisory;
pub mod appointment;
pub mod cascade;
pub mod error;
pub mod group_name;
pub mod keyword;
pub mod model;
pub mod patient;
pub mod predicates;
pub mod snapshot;
pub mod storage;
pub mod vaccination;
pub mod vax_manager;

pub use appointment::{Appointment, AppointmentManager};
pub use cascade::{Cascade, EntityKind, Handler, Managers, ModelChange};
pub use error::{ModelError, Result};
pub use group_name::GroupName;
pub use keyword::{Keyword, KeywordManager};
pub use model::{CommitResult, ModelManager};
pub use patient::{BloodType, Patient, PatientManager};
pub use snapshot::{ModelSnapshot, SnapshotError, SNAPSHOT_VERSION};
pub use storage::StorageModel;
pub use vaccination::{Requirement, RequirementKind, VaxType, VaxTypeBuilder};
pub use vax_manager::VaxTypeManager;

pub use vms_core::{ChangeKind, Id, IdData, Predicate, StoreError, ValueChange};
