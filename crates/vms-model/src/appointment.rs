//! Appointments: a patient booked for a vaccination over a time slot.

use crate::group_name::GroupName;
use crate::patient::PatientManager;
use crate::storage::StorageModel;
use crate::vax_manager::VaxTypeManager;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use vms_core::{Id, StoreError};

/// Manager for appointments, keyed by allocated integer identity.
pub type AppointmentManager = StorageModel<Appointment>;

/// Both `patient_id` and `vaccination` are soft references: a lookup miss
/// means the referent was deleted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "AppointmentRaw")]
pub struct Appointment {
    patient_id: Id,
    vaccination: GroupName,
    start: NaiveDateTime,
    end: NaiveDateTime,
    is_completed: bool,
}

#[derive(Deserialize)]
struct AppointmentRaw {
    patient_id: Id,
    vaccination: GroupName,
    start: NaiveDateTime,
    end: NaiveDateTime,
    #[serde(default)]
    is_completed: bool,
}

impl TryFrom<AppointmentRaw> for Appointment {
    type Error = StoreError;

    fn try_from(raw: AppointmentRaw) -> Result<Self, Self::Error> {
        let appointment = Appointment::new(raw.patient_id, raw.vaccination, raw.start, raw.end)?;
        Ok(if raw.is_completed {
            appointment.mark()
        } else {
            appointment
        })
    }
}

impl Appointment {
    pub fn new(
        patient_id: Id,
        vaccination: GroupName,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Self, StoreError> {
        if start >= end {
            return Err(StoreError::invalid(format!(
                "appointment must start ({}) before it ends ({})",
                start, end
            )));
        }
        Ok(Self {
            patient_id,
            vaccination,
            start,
            end,
            is_completed: false,
        })
    }

    pub fn patient_id(&self) -> Id {
        self.patient_id
    }

    pub fn vaccination(&self) -> &GroupName {
        &self.vaccination
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    /// A copy flagged as completed.
    pub fn mark(&self) -> Self {
        Self {
            is_completed: true,
            ..self.clone()
        }
    }

    /// A copy flagged as not completed.
    pub fn unmark(&self) -> Self {
        Self {
            is_completed: false,
            ..self.clone()
        }
    }

    pub fn overlaps(&self, other: &Appointment) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for Appointment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "patient #{} for {} from {} to {}",
            self.patient_id, self.vaccination, self.start, self.end
        )?;
        if self.is_completed {
            f.write_str(" (completed)")?;
        }
        Ok(())
    }
}

impl StorageModel<Appointment> {
    pub fn appointments_for_patient(&self, patient_id: Id) -> Vec<Id> {
        self.iter()
            .filter(|appt| appt.value().patient_id == patient_id)
            .map(|appt| appt.id())
            .collect()
    }

    pub fn appointments_for_vaccination(&self, vaccination: &GroupName) -> Vec<Id> {
        self.iter()
            .filter(|appt| &appt.value().vaccination == vaccination)
            .map(|appt| appt.id())
            .collect()
    }

    /// Appointments whose patient or vaccination no longer resolves.
    pub fn dangling(&self, patients: &PatientManager, vax_types: &VaxTypeManager) -> Vec<Id> {
        self.iter()
            .filter(|appt| {
                !patients.contains(appt.value().patient_id)
                    || !vax_types.contains(&appt.value().vaccination)
            })
            .map(|appt| appt.id())
            .collect()
    }
}
