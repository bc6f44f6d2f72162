//! Thread-shareable session around a [`ModelManager`].
//!
//! A single `RwLock` guards the model. Every mutation runs under the write
//! lock, including event publication, so subscribers see events in commit
//! order and a reader holding the read lock always sees a state that some
//! event describes.

use crate::config::SessionConfig;
use crate::error::Result;
use crate::event::{EventKind, ModelEvent};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;
use vms_core::{Id, IdData, Predicate, ValueChange};
use vms_model::{
    Appointment, AppointmentManager, CommitResult, EntityKind, GroupName, Keyword, KeywordManager,
    ModelChange, ModelManager, ModelSnapshot, Patient, PatientManager, VaxType, VaxTypeBuilder,
    VaxTypeManager,
};

/// A shared handle on one working set. Clones share the same model.
#[derive(Clone)]
pub struct Session {
    config: SessionConfig,
    model: Arc<RwLock<ModelManager>>,
    event_tx: broadcast::Sender<ModelEvent>,
    history: Arc<Mutex<VecDeque<ModelEvent>>>,
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_model(config, ModelManager::new())
    }

    /// A session over an already-populated model.
    pub fn with_model(config: SessionConfig, model: ModelManager) -> Self {
        let (event_tx, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            config,
            model: Arc::new(RwLock::new(model)),
            event_tx,
            history: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn operator(&self) -> &str {
        &self.config.operator
    }

    /// Subscribe to model events.
    pub fn subscribe(&self) -> broadcast::Receiver<ModelEvent> {
        self.event_tx.subscribe()
    }

    /// The most recent events, oldest first.
    pub fn recent_events(&self) -> Vec<ModelEvent> {
        self.history.lock().iter().cloned().collect()
    }

    /// Read access to the model. Hold the guard briefly: writers wait on it.
    pub fn read(&self) -> RwLockReadGuard<'_, ModelManager> {
        self.model.read()
    }

    pub fn revision(&self) -> u64 {
        self.model.read().revision()
    }

    pub fn snapshot(&self) -> ModelSnapshot {
        self.model.read().snapshot()
    }

    fn publish(&self, revision: u64, kind: EventKind) {
        let event = ModelEvent::new(revision, self.config.operator.clone(), kind);
        debug!(revision, operator = %event.operator, "publishing event");

        {
            let mut history = self.history.lock();
            history.push_back(event.clone());
            while history.len() > self.config.history_limit {
                history.pop_front();
            }
        }

        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }

    fn commit<T, F>(
        &self,
        wrap: fn(ValueChange<T>) -> ModelChange,
        op: F,
    ) -> Result<CommitResult<T>>
    where
        T: Clone,
        F: FnOnce(&mut ModelManager) -> vms_model::Result<CommitResult<T>>,
    {
        let mut model = self.model.write();
        let committed = op(&mut *model)?;
        self.publish(
            model.revision(),
            EventKind::Committed {
                change: wrap(committed.change.clone()),
                cascaded: committed.cascaded.clone(),
            },
        );
        Ok(committed)
    }

    fn update<F>(&self, kind: EventKind, op: F) -> Result<()>
    where
        F: FnOnce(&mut ModelManager) -> vms_model::Result<()>,
    {
        let mut model = self.model.write();
        op(&mut *model)?;
        self.publish(model.revision(), kind);
        Ok(())
    }

    // === Patients ===

    pub fn add_patient(&self, patient: Patient) -> Result<CommitResult<IdData<Patient>>> {
        self.commit(ModelChange::Patient, |m| m.add_patient(patient))
    }

    pub fn set_patient(&self, id: Id, patient: Patient) -> Result<CommitResult<IdData<Patient>>> {
        self.commit(ModelChange::Patient, |m| m.set_patient(id, patient))
    }

    pub fn delete_patient(&self, id: Id) -> Result<CommitResult<IdData<Patient>>> {
        self.commit(ModelChange::Patient, |m| m.delete_patient(id))
    }

    // === Vaccination types ===

    pub fn add_vaccination(&self, vax: VaxType) -> Result<CommitResult<VaxType>> {
        self.commit(ModelChange::Vaccination, |m| m.add_vaccination(vax))
    }

    pub fn set_vaccination(&self, name: &GroupName, vax: VaxType) -> Result<CommitResult<VaxType>> {
        self.commit(ModelChange::Vaccination, |m| m.set_vaccination(name, vax))
    }

    pub fn edit_vaccination(
        &self,
        name: &GroupName,
        builder: VaxTypeBuilder,
    ) -> Result<CommitResult<VaxType>> {
        self.commit(ModelChange::Vaccination, |m| m.edit_vaccination(name, builder))
    }

    pub fn delete_vaccination(&self, name: &GroupName) -> Result<CommitResult<VaxType>> {
        self.commit(ModelChange::Vaccination, |m| m.delete_vaccination(name))
    }

    // === Appointments ===

    pub fn add_appointment(
        &self,
        appointment: Appointment,
    ) -> Result<CommitResult<IdData<Appointment>>> {
        self.commit(ModelChange::Appointment, |m| m.add_appointment(appointment))
    }

    pub fn set_appointment(
        &self,
        id: Id,
        appointment: Appointment,
    ) -> Result<CommitResult<IdData<Appointment>>> {
        self.commit(ModelChange::Appointment, |m| m.set_appointment(id, appointment))
    }

    pub fn delete_appointment(&self, id: Id) -> Result<CommitResult<IdData<Appointment>>> {
        self.commit(ModelChange::Appointment, |m| m.delete_appointment(id))
    }

    pub fn mark_appointment(&self, id: Id) -> Result<CommitResult<IdData<Appointment>>> {
        self.commit(ModelChange::Appointment, |m| m.mark_appointment(id))
    }

    pub fn unmark_appointment(&self, id: Id) -> Result<CommitResult<IdData<Appointment>>> {
        self.commit(ModelChange::Appointment, |m| m.unmark_appointment(id))
    }

    // === Keywords ===

    pub fn add_keyword(&self, keyword: Keyword) -> Result<CommitResult<IdData<Keyword>>> {
        self.commit(ModelChange::Keyword, |m| m.add_keyword(keyword))
    }

    pub fn set_keyword(&self, id: Id, keyword: Keyword) -> Result<CommitResult<IdData<Keyword>>> {
        self.commit(ModelChange::Keyword, |m| m.set_keyword(id, keyword))
    }

    pub fn delete_keyword(&self, id: Id) -> Result<CommitResult<IdData<Keyword>>> {
        self.commit(ModelChange::Keyword, |m| m.delete_keyword(id))
    }

    pub fn resolve_keyword(&self, word: &str) -> String {
        self.model.read().resolve_keyword(word).to_string()
    }

    // === Views and selection ===

    pub fn set_patient_filters(&self, predicates: Vec<Predicate<Patient>>) -> Result<()> {
        let kind = EventKind::FiltersChanged {
            entity: EntityKind::Patient,
        };
        self.update(kind, |m| {
            m.set_patient_filters(predicates);
            Ok(())
        })
    }

    pub fn set_vax_type_filters(&self, predicates: Vec<Predicate<VaxType>>) -> Result<()> {
        let kind = EventKind::FiltersChanged {
            entity: EntityKind::Vaccination,
        };
        self.update(kind, |m| {
            m.set_vax_type_filters(predicates);
            Ok(())
        })
    }

    pub fn set_appointment_filters(&self, predicates: Vec<Predicate<Appointment>>) -> Result<()> {
        let kind = EventKind::FiltersChanged {
            entity: EntityKind::Appointment,
        };
        self.update(kind, |m| {
            m.set_appointment_filters(predicates);
            Ok(())
        })
    }

    pub fn set_keyword_filters(&self, predicates: Vec<Predicate<Keyword>>) -> Result<()> {
        let kind = EventKind::FiltersChanged {
            entity: EntityKind::Keyword,
        };
        self.update(kind, |m| {
            m.set_keyword_filters(predicates);
            Ok(())
        })
    }

    pub fn set_detailed_patient(&self, id: Option<Id>) -> Result<()> {
        let kind = EventKind::SelectionChanged {
            entity: EntityKind::Patient,
        };
        self.update(kind, |m| m.set_detailed_patient(id))
    }

    pub fn set_detailed_vax_type(&self, name: Option<&GroupName>) -> Result<()> {
        let kind = EventKind::SelectionChanged {
            entity: EntityKind::Vaccination,
        };
        self.update(kind, |m| m.set_detailed_vax_type(name))
    }

    // === Advisory validation ===

    pub fn validate_patient_change(
        &self,
        change: &ValueChange<IdData<Patient>>,
    ) -> Result<Vec<String>> {
        Ok(self.model.read().validate_patient_change(change)?)
    }

    pub fn validate_vaccination_change(
        &self,
        change: &ValueChange<VaxType>,
    ) -> Result<Vec<String>> {
        Ok(self.model.read().validate_vaccination_change(change)?)
    }

    // === Bulk reset ===

    fn reset<F>(&self, entity: EntityKind, op: F) -> Result<Vec<ModelChange>>
    where
        F: FnOnce(&mut ModelManager) -> vms_model::Result<Vec<ModelChange>>,
    {
        let mut model = self.model.write();
        let changes = op(&mut *model)?;
        self.publish(
            model.revision(),
            EventKind::Reset {
                entity,
                changes: changes.clone(),
            },
        );
        Ok(changes)
    }

    pub fn set_patient_manager(&self, patients: PatientManager) -> Result<Vec<ModelChange>> {
        self.reset(EntityKind::Patient, |m| Ok(m.set_patient_manager(patients)))
    }

    pub fn set_vax_type_manager(&self, vax_types: VaxTypeManager) -> Result<Vec<ModelChange>> {
        self.reset(EntityKind::Vaccination, |m| {
            Ok(m.set_vax_type_manager(vax_types))
        })
    }

    pub fn set_appointment_manager(
        &self,
        appointments: AppointmentManager,
    ) -> Result<Vec<ModelChange>> {
        self.reset(EntityKind::Appointment, |m| {
            Ok(m.set_appointment_manager(appointments))
        })
    }

    /// Fails without publishing if two keywords share an alias.
    pub fn set_keyword_manager(&self, keywords: KeywordManager) -> Result<Vec<ModelChange>> {
        self.reset(EntityKind::Keyword, |m| m.set_keyword_manager(keywords))
    }

    pub fn restore(&self, snapshot: ModelSnapshot) -> Result<Vec<ModelChange>> {
        let mut model = self.model.write();
        let retracted = model.restore(snapshot)?;
        self.publish(
            model.revision(),
            EventKind::Restored {
                retracted: retracted.clone(),
            },
        );
        Ok(retracted)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}
