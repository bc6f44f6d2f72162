//! The orchestrator: owns every manager, the filtered views over them and
//! the detail-selection bindings, and is the only place a change in one
//! manager is carried into the others.
//!
//! Every mutation goes through the same commit path:
//!
//! 1. the owning manager applies it and returns the primary transition,
//! 2. the [`Cascade`] dispatches it and everything it triggers,
//! 3. each dispatched transition is offered to the detail bindings,
//! 4. every filtered view is synced and the model revision is bumped.
//!
//! Readers therefore never observe a dangling reference, a stale binding or
//! a stale view between two calls.

use crate::appointment::{Appointment, AppointmentManager};
use crate::cascade::{strip_patient_groups, Cascade, Managers, ModelChange};
use crate::error::Result;
use crate::group_name::GroupName;
use crate::keyword::{Keyword, KeywordManager};
use crate::patient::{Patient, PatientManager};
use crate::snapshot::{ModelSnapshot, SnapshotError, SNAPSHOT_VERSION};
use crate::vaccination::{VaxType, VaxTypeBuilder};
use crate::vax_manager::VaxTypeManager;
use tracing::{debug, info, warn};
use vms_core::{FilteredMap, FilteredView, Id, IdData, Predicate, StoreError, ValueChange};

/// Outcome of a committed mutation.
#[derive(Clone, Debug, PartialEq)]
pub struct CommitResult<T> {
    /// The primary transition.
    pub change: ValueChange<T>,
    /// Transitions the cascade derived from it, in dispatch order.
    pub cascaded: Vec<ModelChange>,
}

impl<T> CommitResult<T> {
    /// The value after the commit, absent for deletions.
    pub fn value(&self) -> Option<&T> {
        self.change.new()
    }

    pub fn has_cascades(&self) -> bool {
        !self.cascaded.is_empty()
    }
}

pub struct ModelManager {
    pub(crate) managers: Managers,
    pub(crate) cascade: Cascade,
    patient_view: FilteredView<Id, IdData<Patient>>,
    vax_type_view: FilteredView<GroupName, VaxType>,
    appointment_view: FilteredView<Id, IdData<Appointment>>,
    keyword_view: FilteredView<Id, IdData<Keyword>>,
    detailed_patient: Option<IdData<Patient>>,
    detailed_vax_type: Option<VaxType>,
    revision: u64,
}

impl ModelManager {
    pub fn new() -> Self {
        Self::with_cascade(Cascade::standard())
    }

    /// An orchestrator dispatching through `cascade` instead of the
    /// standard handler list.
    pub fn with_cascade(cascade: Cascade) -> Self {
        let mut model = Self {
            managers: Managers::new(),
            cascade,
            patient_view: FilteredView::new(),
            vax_type_view: FilteredView::new(),
            appointment_view: FilteredView::new(),
            keyword_view: FilteredView::new(),
            detailed_patient: None,
            detailed_vax_type: None,
            revision: 0,
        };
        model.sync_views();
        model
    }

    /// Counter bumped by every commit, reset and filter change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn managers(&self) -> &Managers {
        &self.managers
    }

    pub fn patients(&self) -> &PatientManager {
        &self.managers.patients
    }

    pub fn vax_types(&self) -> &VaxTypeManager {
        &self.managers.vax_types
    }

    pub fn appointments(&self) -> &AppointmentManager {
        &self.managers.appointments
    }

    pub fn keywords(&self) -> &KeywordManager {
        &self.managers.keywords
    }

    // === Commit path ===

    fn commit<T>(
        &mut self,
        change: ValueChange<T>,
        wrap: fn(ValueChange<T>) -> ModelChange,
    ) -> CommitResult<T>
    where
        T: Clone,
    {
        let primary = wrap(change.clone());
        debug!(change = %primary, "commit");

        let mut dispatched = self.cascade.dispatch(&mut self.managers, primary);
        for transition in &dispatched {
            self.follow_bindings(transition);
        }
        let cascaded = dispatched.split_off(1);
        if !cascaded.is_empty() {
            info!(
                change = %dispatched[0],
                cascaded = cascaded.len(),
                "commit cascaded"
            );
        }

        self.finish();
        CommitResult { change, cascaded }
    }

    fn follow_bindings(&mut self, change: &ModelChange) {
        match change {
            ModelChange::Patient(change) => {
                let next = self
                    .detailed_patient
                    .as_ref()
                    .and_then(|current| change.follow(current));
                if let Some(next) = next {
                    self.detailed_patient = next.cloned();
                }
            }
            ModelChange::Vaccination(change) => {
                let next = self
                    .detailed_vax_type
                    .as_ref()
                    .and_then(|current| change.follow(current));
                if let Some(next) = next {
                    self.detailed_vax_type = next.cloned();
                }
            }
            ModelChange::Appointment(_) | ModelChange::Keyword(_) => {}
        }
    }

    fn sync_views(&mut self) {
        self.patient_view.sync(self.managers.patients.map_view());
        self.vax_type_view.sync(self.managers.vax_types.map_view());
        self.appointment_view
            .sync(self.managers.appointments.map_view());
        self.keyword_view.sync(self.managers.keywords.map_view());
    }

    fn finish(&mut self) {
        self.sync_views();
        self.revision += 1;
    }

    // === Patients ===

    /// Add a patient. Every allergy and vaccine must resolve to a
    /// vaccination type.
    pub fn add_patient(&mut self, patient: Patient) -> Result<CommitResult<IdData<Patient>>> {
        self.managers.check_patient_groups(&patient)?;
        let change = self.managers.patients.add(patient);
        Ok(self.commit(change, ModelChange::Patient))
    }

    pub fn set_patient(
        &mut self,
        id: Id,
        patient: Patient,
    ) -> Result<CommitResult<IdData<Patient>>> {
        if !self.managers.patients.contains(id) {
            return Err(StoreError::not_found(id).into());
        }
        self.managers.check_patient_groups(&patient)?;
        let change = self.managers.patients.set(id, patient)?;
        Ok(self.commit(change, ModelChange::Patient))
    }

    pub fn delete_patient(&mut self, id: Id) -> Result<CommitResult<IdData<Patient>>> {
        let change = self.managers.patients.remove(id)?;
        Ok(self.commit(change, ModelChange::Patient))
    }

    // === Vaccination types ===

    pub fn add_vaccination(&mut self, vax: VaxType) -> Result<CommitResult<VaxType>> {
        let change = self.managers.vax_types.add(vax)?;
        Ok(self.commit(change, ModelChange::Vaccination))
    }

    /// Replace the type stored under `name`. Renames are rejected; use
    /// [`edit_vaccination`](Self::edit_vaccination).
    pub fn set_vaccination(
        &mut self,
        name: &GroupName,
        vax: VaxType,
    ) -> Result<CommitResult<VaxType>> {
        let change = self.managers.vax_types.set(name, vax)?;
        Ok(self.commit(change, ModelChange::Vaccination))
    }

    /// Apply `builder` to the type stored under `name`. A builder carrying
    /// a different name renames the type: the old name is removed and the
    /// new one added, reported as a single edit.
    pub fn edit_vaccination(
        &mut self,
        name: &GroupName,
        builder: VaxTypeBuilder,
    ) -> Result<CommitResult<VaxType>> {
        let vax = builder.build()?;
        if vax.name() == name {
            return self.set_vaccination(name, vax);
        }

        let old = self
            .managers
            .vax_types
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::not_found(name))?;
        if self.managers.vax_types.contains(vax.name()) {
            return Err(StoreError::duplicate(vax.name()).into());
        }

        self.managers.vax_types.remove(name)?;
        self.managers.vax_types.add(vax.clone())?;
        debug!(from = %name, to = %vax.name(), "vaccination renamed");
        Ok(self.commit(ValueChange::edited(old, vax), ModelChange::Vaccination))
    }

    pub fn delete_vaccination(&mut self, name: &GroupName) -> Result<CommitResult<VaxType>> {
        let change = self.managers.vax_types.remove(name)?;
        Ok(self.commit(change, ModelChange::Vaccination))
    }

    // === Appointments ===

    fn check_references(&self, appointment: &Appointment) -> Result<()> {
        if !self.managers.patients.contains(appointment.patient_id()) {
            let patient = format!("patient #{}", appointment.patient_id());
            return Err(StoreError::not_found(patient).into());
        }
        if !self.managers.vax_types.contains(appointment.vaccination()) {
            return Err(
                StoreError::not_found(format!("vaccination {}", appointment.vaccination())).into(),
            );
        }
        Ok(())
    }

    /// Book an appointment. The patient and vaccination must exist.
    pub fn add_appointment(
        &mut self,
        appointment: Appointment,
    ) -> Result<CommitResult<IdData<Appointment>>> {
        self.check_references(&appointment)?;
        let change = self.managers.appointments.add(appointment);
        Ok(self.commit(change, ModelChange::Appointment))
    }

    pub fn set_appointment(
        &mut self,
        id: Id,
        appointment: Appointment,
    ) -> Result<CommitResult<IdData<Appointment>>> {
        if !self.managers.appointments.contains(id) {
            return Err(StoreError::not_found(id).into());
        }
        self.check_references(&appointment)?;
        let change = self.managers.appointments.set(id, appointment)?;
        Ok(self.commit(change, ModelChange::Appointment))
    }

    pub fn delete_appointment(&mut self, id: Id) -> Result<CommitResult<IdData<Appointment>>> {
        let change = self.managers.appointments.remove(id)?;
        Ok(self.commit(change, ModelChange::Appointment))
    }

    pub fn mark_appointment(&mut self, id: Id) -> Result<CommitResult<IdData<Appointment>>> {
        self.update_appointment(id, Appointment::mark)
    }

    pub fn unmark_appointment(&mut self, id: Id) -> Result<CommitResult<IdData<Appointment>>> {
        self.update_appointment(id, Appointment::unmark)
    }

    fn update_appointment(
        &mut self,
        id: Id,
        update: fn(&Appointment) -> Appointment,
    ) -> Result<CommitResult<IdData<Appointment>>> {
        let updated = self
            .managers
            .appointments
            .get(id)
            .map(|record| update(record.value()))
            .ok_or_else(|| StoreError::not_found(id))?;
        let change = self.managers.appointments.set(id, updated)?;
        Ok(self.commit(change, ModelChange::Appointment))
    }

    // === Keywords ===

    pub fn add_keyword(&mut self, keyword: Keyword) -> Result<CommitResult<IdData<Keyword>>> {
        let change = self.managers.keywords.add_keyword(keyword)?;
        Ok(self.commit(change, ModelChange::Keyword))
    }

    pub fn set_keyword(
        &mut self,
        id: Id,
        keyword: Keyword,
    ) -> Result<CommitResult<IdData<Keyword>>> {
        let change = self.managers.keywords.set_keyword(id, keyword)?;
        Ok(self.commit(change, ModelChange::Keyword))
    }

    pub fn delete_keyword(&mut self, id: Id) -> Result<CommitResult<IdData<Keyword>>> {
        let change = self.managers.keywords.remove(id)?;
        Ok(self.commit(change, ModelChange::Keyword))
    }

    /// The command word `word` is an alias for, or `word` itself.
    pub fn resolve_keyword<'a>(&'a self, word: &'a str) -> &'a str {
        self.managers.keywords.resolve(word)
    }

    // === Filtered views ===

    fn filters_changed(&mut self) {
        self.finish();
    }

    pub fn set_patient_filter(&mut self, predicate: Predicate<Patient>) {
        self.patient_view.set_filter(predicate);
        self.filters_changed();
    }

    pub fn set_patient_filters(&mut self, predicates: Vec<Predicate<Patient>>) {
        self.patient_view.set_filters(predicates);
        self.filters_changed();
    }

    pub fn set_vax_type_filter(&mut self, predicate: Predicate<VaxType>) {
        self.vax_type_view.set_filter(predicate);
        self.filters_changed();
    }

    pub fn set_vax_type_filters(&mut self, predicates: Vec<Predicate<VaxType>>) {
        self.vax_type_view.set_filters(predicates);
        self.filters_changed();
    }

    pub fn set_appointment_filter(&mut self, predicate: Predicate<Appointment>) {
        self.appointment_view.set_filter(predicate);
        self.filters_changed();
    }

    pub fn set_appointment_filters(&mut self, predicates: Vec<Predicate<Appointment>>) {
        self.appointment_view.set_filters(predicates);
        self.filters_changed();
    }

    pub fn set_keyword_filter(&mut self, predicate: Predicate<Keyword>) {
        self.keyword_view.set_filter(predicate);
        self.filters_changed();
    }

    pub fn set_keyword_filters(&mut self, predicates: Vec<Predicate<Keyword>>) {
        self.keyword_view.set_filters(predicates);
        self.filters_changed();
    }

    pub fn filtered_patients(&self) -> FilteredMap<'_, Id, IdData<Patient>> {
        self.patient_view.view(self.managers.patients.map_view())
    }

    pub fn filtered_vax_types(&self) -> FilteredMap<'_, GroupName, VaxType> {
        self.vax_type_view.view(self.managers.vax_types.map_view())
    }

    pub fn filtered_appointments(&self) -> FilteredMap<'_, Id, IdData<Appointment>> {
        self.appointment_view
            .view(self.managers.appointments.map_view())
    }

    pub fn filtered_keywords(&self) -> FilteredMap<'_, Id, IdData<Keyword>> {
        self.keyword_view.view(self.managers.keywords.map_view())
    }

    // === Detail bindings ===

    pub fn detailed_patient(&self) -> Option<&IdData<Patient>> {
        self.detailed_patient.as_ref()
    }

    pub fn detailed_vax_type(&self) -> Option<&VaxType> {
        self.detailed_vax_type.as_ref()
    }

    /// Select the patient shown in detail; `None` clears the selection.
    pub fn set_detailed_patient(&mut self, id: Option<Id>) -> Result<()> {
        self.detailed_patient = match id {
            Some(id) => Some(
                self.managers
                    .patients
                    .get(id)
                    .cloned()
                    .ok_or_else(|| StoreError::not_found(id))?,
            ),
            None => None,
        };
        self.revision += 1;
        Ok(())
    }

    /// Select the vaccination type shown in detail; `None` clears the
    /// selection.
    pub fn set_detailed_vax_type(&mut self, name: Option<&GroupName>) -> Result<()> {
        self.detailed_vax_type = match name {
            Some(name) => Some(
                self.managers
                    .vax_types
                    .get(name)
                    .cloned()
                    .ok_or_else(|| StoreError::not_found(name))?,
            ),
            None => None,
        };
        self.revision += 1;
        Ok(())
    }

    fn refresh_bindings(&mut self) {
        self.detailed_patient = self
            .detailed_patient
            .take()
            .and_then(|current| self.managers.patients.get(current.id()).cloned());
        self.detailed_vax_type = self
            .detailed_vax_type
            .take()
            .and_then(|current| self.managers.vax_types.get(current.name()).cloned());
    }

    // === Bulk reset ===

    /// Swap in a whole patient collection. Patients that disappeared or
    /// changed are dispatched through the cascade. The incoming allocator is
    /// advanced past every identity this model has handed out.
    pub fn set_patient_manager(&mut self, mut patients: PatientManager) -> Vec<ModelChange> {
        patients.advance_to(self.managers.patients.next_id());
        let old = std::mem::replace(&mut self.managers.patients, patients);
        let mut diff = Vec::new();
        for record in old.iter() {
            match self.managers.patients.get(record.id()) {
                None => diff.push(ValueChange::deleted(record.clone())),
                Some(current) if current != record => {
                    diff.push(ValueChange::edited(record.clone(), current.clone()))
                }
                Some(_) => {}
            }
        }
        info!(patients = self.managers.patients.len(), "patient manager reset");
        self.patient_view.invalidate();
        self.reset_with(diff.into_iter().map(ModelChange::Patient).collect())
    }

    /// Swap in a whole vaccination-type collection. Types that disappeared
    /// or changed are dispatched through the cascade.
    pub fn set_vax_type_manager(&mut self, vax_types: VaxTypeManager) -> Vec<ModelChange> {
        let old = std::mem::replace(&mut self.managers.vax_types, vax_types);
        let mut diff = Vec::new();
        for vax in old.values() {
            match self.managers.vax_types.get(vax.name()) {
                None => diff.push(ValueChange::deleted(vax.clone())),
                Some(current) if current != vax => {
                    diff.push(ValueChange::edited(vax.clone(), current.clone()))
                }
                Some(_) => {}
            }
        }
        info!(vax_types = self.managers.vax_types.len(), "vaccination manager reset");
        self.vax_type_view.invalidate();
        self.reset_with(diff.into_iter().map(ModelChange::Vaccination).collect())
    }

    pub fn set_appointment_manager(
        &mut self,
        mut appointments: AppointmentManager,
    ) -> Vec<ModelChange> {
        appointments.advance_to(self.managers.appointments.next_id());
        self.managers.appointments = appointments;
        info!(
            appointments = self.managers.appointments.len(),
            "appointment manager reset"
        );
        self.appointment_view.invalidate();
        self.reset_with(Vec::new())
    }

    /// Swap in a whole keyword collection. Fails without touching the
    /// model if two keywords share an alias.
    pub fn set_keyword_manager(
        &mut self,
        mut keywords: KeywordManager,
    ) -> Result<Vec<ModelChange>> {
        keywords.check_aliases()?;
        keywords.advance_to(self.managers.keywords.next_id());
        self.managers.keywords = keywords;
        info!(keywords = self.managers.keywords.len(), "keyword manager reset");
        self.keyword_view.invalidate();
        Ok(self.reset_with(Vec::new()))
    }

    /// Dispatch `diff`, then reconcile. Returns everything that was
    /// dispatched or retracted.
    fn reset_with(&mut self, diff: Vec<ModelChange>) -> Vec<ModelChange> {
        let mut changes = Vec::new();
        for change in diff {
            changes.extend(self.cascade.dispatch(&mut self.managers, change));
        }
        changes.extend(self.reconcile());
        changes
    }

    /// Drop patient groups and retract appointments whose referents no
    /// longer resolve, then re-resolve both bindings by identity and sync
    /// every view.
    pub fn reconcile(&mut self) -> Vec<ModelChange> {
        let mut changes = Vec::new();
        let unresolved = self.managers.unresolved_patient_groups();
        if !unresolved.is_empty() {
            warn!(count = unresolved.len(), "dropping unresolved patient groups");
            for edit in strip_patient_groups(&mut self.managers, &unresolved) {
                changes.extend(self.cascade.dispatch(&mut self.managers, edit));
            }
        }

        let dangling = self
            .managers
            .appointments
            .dangling(&self.managers.patients, &self.managers.vax_types);
        if !dangling.is_empty() {
            warn!(count = dangling.len(), "retracting dangling appointments");
        }
        changes.extend(
            dangling
                .into_iter()
                .filter_map(|id| self.managers.appointments.remove(id).ok())
                .map(ModelChange::Appointment),
        );

        self.refresh_bindings();
        self.finish();
        changes
    }

    // === Persistence ===

    pub fn snapshot(&self) -> ModelSnapshot {
        ModelSnapshot::new(
            self.managers.patients.records(),
            self.managers.vax_types.records(),
            self.managers.appointments.records(),
            self.managers.keywords.records(),
        )
    }

    /// Install `snapshot`, preserving its identities and order. Fails
    /// without touching the model if the snapshot is malformed. Identity
    /// allocators only move forward, so nothing restored collides with an
    /// identity handed out earlier in the session.
    pub fn restore(&mut self, snapshot: ModelSnapshot) -> Result<Vec<ModelChange>> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::VersionMismatch {
                expected: SNAPSHOT_VERSION,
                actual: snapshot.version,
            }
            .into());
        }

        let mut staged = self.managers.clone();
        staged.patients.reset_data(snapshot.patients)?;
        staged.vax_types.reset_data(snapshot.vax_types)?;
        staged.appointments.reset_data(snapshot.appointments)?;
        staged.keywords.reset_data(snapshot.keywords)?;
        staged.keywords.check_aliases()?;
        self.managers = staged;

        info!(
            patients = self.managers.patients.len(),
            vax_types = self.managers.vax_types.len(),
            appointments = self.managers.appointments.len(),
            "snapshot restored"
        );
        self.patient_view.invalidate();
        self.vax_type_view.invalidate();
        self.appointment_view.invalidate();
        self.keyword_view.invalidate();
        Ok(self.reconcile())
    }
}

impl Default for ModelManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ModelManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelManager")
            .field("patients", &self.managers.patients.len())
            .field("vax_types", &self.managers.vax_types.len())
            .field("appointments", &self.managers.appointments.len())
            .field("keywords", &self.managers.keywords.len())
            .field("revision", &self.revision)
            .finish()
    }
}
