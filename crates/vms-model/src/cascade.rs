//! Cascade dispatch: turning a change in one manager into the changes it
//! forces on the others.
//!
//! Every committed transition is wrapped in a [`ModelChange`] and offered
//! to each registered handler. Handlers apply their follow-up mutations to
//! the [`Managers`] directly and return the transitions those mutations
//! produced, which are queued and offered to every handler in turn. The
//! queue is FIFO, so transitions are reported in the order they happened.
//!
//! Every default handler only removes or shrinks state, so dispatch always
//! drains.

use crate::appointment::{Appointment, AppointmentManager};
use crate::group_name::GroupName;
use crate::keyword::{Keyword, KeywordManager};
use crate::patient::{Patient, PatientManager};
use crate::vaccination::VaxType;
use crate::vax_manager::VaxTypeManager;
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use vms_core::{ChangeKind, Id, IdData, StoreError, ValueChange};

/// The four entity managers, owned together so a handler can update one
/// in response to another.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Managers {
    pub patients: PatientManager,
    pub vax_types: VaxTypeManager,
    pub appointments: AppointmentManager,
    pub keywords: KeywordManager,
}

impl Managers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails with `NotFound` on the first group of `patient` that no
    /// vaccination type resolves.
    pub fn check_patient_groups(&self, patient: &Patient) -> Result<(), StoreError> {
        match patient.group_refs().find(|g| !self.vax_types.resolves(g)) {
            Some(group) => Err(StoreError::not_found(format!("group {}", group))),
            None => Ok(()),
        }
    }

    /// Group names held by some patient that no vaccination type resolves.
    pub fn unresolved_patient_groups(&self) -> BTreeSet<GroupName> {
        self.patients
            .iter()
            .flat_map(|record| record.value().group_refs())
            .filter(|group| !self.vax_types.resolves(group))
            .cloned()
            .collect()
    }
}

/// Which collection a [`ModelChange`] concerns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Patient,
    Vaccination,
    Appointment,
    Keyword,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Patient => "patient",
            EntityKind::Vaccination => "vaccination",
            EntityKind::Appointment => "appointment",
            EntityKind::Keyword => "keyword",
        };
        f.write_str(name)
    }
}

/// A committed transition on one of the managers.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelChange {
    Patient(ValueChange<IdData<Patient>>),
    Vaccination(ValueChange<VaxType>),
    Appointment(ValueChange<IdData<Appointment>>),
    Keyword(ValueChange<IdData<Keyword>>),
}

impl ModelChange {
    pub fn entity(&self) -> EntityKind {
        match self {
            ModelChange::Patient(_) => EntityKind::Patient,
            ModelChange::Vaccination(_) => EntityKind::Vaccination,
            ModelChange::Appointment(_) => EntityKind::Appointment,
            ModelChange::Keyword(_) => EntityKind::Keyword,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        match self {
            ModelChange::Patient(change) => change.kind(),
            ModelChange::Vaccination(change) => change.kind(),
            ModelChange::Appointment(change) => change.kind(),
            ModelChange::Keyword(change) => change.kind(),
        }
    }

    /// Identity of the entity the change concerns, as text.
    pub fn subject(&self) -> String {
        fn id_of<T>(change: &ValueChange<IdData<T>>) -> String {
            change
                .old()
                .or(change.new())
                .map(|record| format!("#{}", record.id()))
                .unwrap_or_default()
        }

        match self {
            ModelChange::Patient(change) => id_of(change),
            ModelChange::Appointment(change) => id_of(change),
            ModelChange::Keyword(change) => id_of(change),
            ModelChange::Vaccination(change) => change
                .old()
                .or(change.new())
                .map(|vax| vax.name().to_string())
                .unwrap_or_default(),
        }
    }

    /// Human-readable one-liner, used for advisory messages.
    pub fn describe(&self) -> String {
        let verb = match self.kind() {
            ChangeKind::Created => "created",
            ChangeKind::Edited => "updated",
            ChangeKind::Deleted => "deleted",
        };
        let detail = match self {
            ModelChange::Patient(change) => match (change.old(), change.new()) {
                (Some(old), Some(new)) => {
                    let lost: Vec<String> = old
                        .value()
                        .allergies()
                        .difference(new.value().allergies())
                        .chain(old.value().vaccines().difference(new.value().vaccines()))
                        .map(GroupName::to_string)
                        .collect();
                    if lost.is_empty() {
                        String::new()
                    } else {
                        format!(": loses {}", lost.join(", "))
                    }
                }
                _ => String::new(),
            },
            ModelChange::Appointment(change) => change
                .old()
                .or(change.new())
                .map(|appt| format!(" ({})", appt.value()))
                .unwrap_or_default(),
            _ => String::new(),
        };
        format!("{} {} {}{}", self.entity(), self.subject(), verb, detail)
    }
}

impl fmt::Display for ModelChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// A cascade handler: reacts to one transition by mutating the managers and
/// returning the transitions it produced.
pub type Handler = Arc<dyn Fn(&mut Managers, &ModelChange) -> Vec<ModelChange> + Send + Sync>;

/// The registered handler list.
#[derive(Clone)]
pub struct Cascade {
    handlers: Vec<(&'static str, Handler)>,
}

impl Cascade {
    /// A cascade with no handlers: every commit stands alone.
    pub fn empty() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// The standard registration: patient deletions and vaccination
    /// transitions retract dependent appointments, and vaccination
    /// transitions drop unresolvable group names from patients.
    pub fn standard() -> Self {
        let mut cascade = Self::empty();
        cascade.register("patient-appointments", retract_appointments_of_deleted_patient);
        cascade.register(
            "vaccination-appointments",
            retract_appointments_of_unresolved_vaccination,
        );
        cascade.register("vaccination-patients", drop_unresolved_groups_from_patients);
        cascade
    }

    pub fn register<F>(&mut self, name: &'static str, handler: F)
    where
        F: Fn(&mut Managers, &ModelChange) -> Vec<ModelChange> + Send + Sync + 'static,
    {
        self.handlers.push((name, Arc::new(handler)));
    }

    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|(name, _)| *name).collect()
    }

    /// Run `primary` and everything it triggers through the handlers.
    ///
    /// Returns every transition in dispatch order, starting with `primary`.
    pub fn dispatch(&self, managers: &mut Managers, primary: ModelChange) -> Vec<ModelChange> {
        let mut queue = VecDeque::from([primary]);
        let mut dispatched = Vec::new();

        while let Some(change) = queue.pop_front() {
            for (name, handler) in &self.handlers {
                for secondary in handler(managers, &change) {
                    debug!(handler = *name, change = %secondary, "cascaded");
                    queue.push_back(secondary);
                }
            }
            dispatched.push(change);
        }

        dispatched
    }
}

impl Default for Cascade {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for Cascade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cascade")
            .field("handlers", &self.handler_names())
            .finish()
    }
}

/// Deleting a patient retracts every appointment booked for them. Edits
/// keep appointments.
pub fn retract_appointments_of_deleted_patient(
    managers: &mut Managers,
    change: &ModelChange,
) -> Vec<ModelChange> {
    let ModelChange::Patient(change) = change else {
        return Vec::new();
    };
    let Some(patient) = change.old().filter(|_| change.is_deletion()) else {
        return Vec::new();
    };

    let ids = managers.appointments.appointments_for_patient(patient.id());
    retract_appointments(&mut managers.appointments, ids)
}

/// A vaccination transition retracts every appointment whose vaccination
/// no longer names a vaccination type.
pub fn retract_appointments_of_unresolved_vaccination(
    managers: &mut Managers,
    change: &ModelChange,
) -> Vec<ModelChange> {
    let ModelChange::Vaccination(change) = change else {
        return Vec::new();
    };
    let Some(old) = change.old() else {
        return Vec::new();
    };
    if managers.vax_types.contains(old.name()) {
        return Vec::new();
    }

    let ids = managers.appointments.appointments_for_vaccination(old.name());
    retract_appointments(&mut managers.appointments, ids)
}

/// A vaccination transition drops, from every patient's allergies and
/// vaccines, the group names the old value made resolvable that no
/// vaccination type resolves any more.
pub fn drop_unresolved_groups_from_patients(
    managers: &mut Managers,
    change: &ModelChange,
) -> Vec<ModelChange> {
    let ModelChange::Vaccination(change) = change else {
        return Vec::new();
    };
    let Some(old) = change.old() else {
        return Vec::new();
    };

    let dropped: BTreeSet<GroupName> = old
        .group_names()
        .into_iter()
        .filter(|group| !managers.vax_types.resolves(group))
        .collect();
    strip_patient_groups(managers, &dropped)
}

/// Remove `dropped` from every patient holding one of them, returning the
/// patient edits.
pub(crate) fn strip_patient_groups(
    managers: &mut Managers,
    dropped: &BTreeSet<GroupName>,
) -> Vec<ModelChange> {
    if dropped.is_empty() {
        return Vec::new();
    }

    let updates: Vec<_> = managers
        .patients
        .iter()
        .filter_map(|record| {
            record
                .value()
                .without_groups(dropped)
                .map(|patient| (record.id(), patient))
        })
        .collect();

    updates
        .into_iter()
        .filter_map(|(id, patient)| managers.patients.set(id, patient).ok())
        .map(ModelChange::Patient)
        .collect()
}

fn retract_appointments(
    appointments: &mut AppointmentManager,
    ids: Vec<Id>,
) -> Vec<ModelChange> {
    ids.into_iter()
        .filter_map(|id| appointments.remove(id).ok())
        .map(ModelChange::Appointment)
        .collect()
}
