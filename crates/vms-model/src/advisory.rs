//! Advisory validation: what would a candidate change cascade into?
//!
//! A candidate is simulated against a copy of the managers with the same
//! handler list the orchestrator commits through. Nothing on the live model
//! is touched. The candidate's old side must describe the current state of
//! its entity, so a preview is never computed against data the caller has
//! not seen.

use crate::cascade::{Managers, ModelChange};
use crate::error::Result;
use crate::model::ModelManager;
use crate::patient::Patient;
use crate::vaccination::VaxType;
use vms_core::{IdData, StoreError, ValueChange};

impl ModelManager {
    /// The secondary transitions committing `change` would produce.
    pub fn preview_patient_change(
        &self,
        change: &ValueChange<IdData<Patient>>,
    ) -> Result<Vec<ModelChange>> {
        let mut staged = self.managers.clone();
        stage_patient(&mut staged, change)?;
        Ok(self.simulate(staged, ModelChange::Patient(change.clone())))
    }

    /// The secondary transitions committing `change` would produce.
    pub fn preview_vaccination_change(
        &self,
        change: &ValueChange<VaxType>,
    ) -> Result<Vec<ModelChange>> {
        let mut staged = self.managers.clone();
        stage_vaccination(&mut staged, change)?;
        Ok(self.simulate(staged, ModelChange::Vaccination(change.clone())))
    }

    /// Human-readable warnings for a patient change; empty when the commit
    /// would stand alone.
    pub fn validate_patient_change(
        &self,
        change: &ValueChange<IdData<Patient>>,
    ) -> Result<Vec<String>> {
        Ok(describe_all(&self.preview_patient_change(change)?))
    }

    /// Human-readable warnings for a vaccination change; empty when the
    /// commit would stand alone.
    pub fn validate_vaccination_change(
        &self,
        change: &ValueChange<VaxType>,
    ) -> Result<Vec<String>> {
        Ok(describe_all(&self.preview_vaccination_change(change)?))
    }

    fn simulate(&self, mut staged: Managers, primary: ModelChange) -> Vec<ModelChange> {
        let mut dispatched = self.cascade.dispatch(&mut staged, primary);
        dispatched.split_off(1)
    }
}

fn describe_all(changes: &[ModelChange]) -> Vec<String> {
    changes.iter().map(ModelChange::describe).collect()
}

fn stage_patient(staged: &mut Managers, change: &ValueChange<IdData<Patient>>) -> Result<()> {
    match (change.old(), change.new()) {
        (None, Some(new)) => {
            if staged.patients.contains(new.id()) {
                return Err(StoreError::duplicate(format!("patient #{}", new.id())).into());
            }
            let next = staged.patients.next_id();
            if new.id() != next {
                return Err(StoreError::invalid(format!(
                    "a new patient would be #{}, not #{}",
                    next,
                    new.id()
                ))
                .into());
            }
            staged.check_patient_groups(new.value())?;
            staged.patients.add_record(new.clone());
        }
        (Some(old), new) => {
            match staged.patients.get(old.id()) {
                None => return Err(StoreError::not_found(format!("patient #{}", old.id())).into()),
                Some(current) if current != old => {
                    return Err(StoreError::invalid(format!(
                        "patient #{} has changed since the candidate was made",
                        old.id()
                    ))
                    .into())
                }
                Some(_) => {}
            }
            match new {
                Some(new) if new.id() != old.id() => {
                    return Err(StoreError::invalid(format!(
                        "patient #{} cannot change identity to #{}",
                        old.id(),
                        new.id()
                    ))
                    .into())
                }
                Some(new) => {
                    staged.check_patient_groups(new.value())?;
                    staged.patients.set(old.id(), new.value().clone())?;
                }
                None => {
                    staged.patients.remove(old.id())?;
                }
            }
        }
        (None, None) => {}
    }
    Ok(())
}

fn stage_vaccination(staged: &mut Managers, change: &ValueChange<VaxType>) -> Result<()> {
    match (change.old(), change.new()) {
        (None, Some(new)) => {
            staged.vax_types.add(new.clone())?;
        }
        (Some(old), new) => {
            match staged.vax_types.get(old.name()) {
                None => return Err(StoreError::not_found(old.name()).into()),
                Some(current) if current != old => {
                    return Err(StoreError::invalid(format!(
                        "vaccination {} has changed since the candidate was made",
                        old.name()
                    ))
                    .into())
                }
                Some(_) => {}
            }
            match new {
                Some(new) if new.name() == old.name() => {
                    staged.vax_types.set(old.name(), new.clone())?;
                }
                Some(new) => {
                    if staged.vax_types.contains(new.name()) {
                        return Err(StoreError::duplicate(new.name()).into());
                    }
                    staged.vax_types.remove(old.name())?;
                    staged.vax_types.add(new.clone())?;
                }
                None => {
                    staged.vax_types.remove(old.name())?;
                }
            }
        }
        (None, None) => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appointment::Appointment;
    use crate::group_name::GroupName;
    use crate::patient::BloodType;
    use chrono::NaiveDate;

    fn name(s: &str) -> GroupName {
        GroupName::new(s).unwrap()
    }

    fn seeded() -> ModelManager {
        let mut model = ModelManager::new();
        model
            .add_vaccination(VaxType::builder(name("Flu")).build().unwrap())
            .unwrap();
        let patient = Patient::new(
            "Alex",
            "999",
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            BloodType::APositive,
        )
        .unwrap()
        .with_vaccines([name("Flu")]);
        model.add_patient(patient).unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        model
            .add_appointment(
                Appointment::new(0, name("Flu"), start, start + chrono::Duration::hours(1))
                    .unwrap(),
            )
            .unwrap();
        model
    }

    #[test]
    fn test_preview_vaccination_deletion() {
        let model = seeded();
        let flu = model.vax_types().get(&name("Flu")).unwrap().clone();
        let revision = model.revision();

        let effects = model
            .preview_vaccination_change(&ValueChange::deleted(flu))
            .unwrap();
        assert_eq!(effects.len(), 2);

        // Nothing on the live model moved.
        assert_eq!(model.revision(), revision);
        assert_eq!(model.appointments().len(), 1);
        assert!(model.vax_types().contains(&name("Flu")));
    }

    #[test]
    fn test_validate_patient_deletion_messages() {
        let model = seeded();
        let patient = model.patients().get(0).unwrap().clone();

        let messages = model
            .validate_patient_change(&ValueChange::deleted(patient))
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("appointment #0 deleted"));
    }

    #[test]
    fn test_edit_without_effects_is_empty() {
        let model = seeded();
        let patient = model.patients().get(0).unwrap().clone();
        let renamed = Patient::new(
            "Alexander",
            "999",
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            BloodType::APositive,
        )
        .unwrap();

        let messages = model
            .validate_patient_change(&ValueChange::edited(
                patient.clone(),
                patient.with_value(renamed),
            ))
            .unwrap();
        assert!(messages.is_empty());
    }

    #[test]
    fn test_stale_candidate_rejected() {
        let model = seeded();
        let stale = VaxType::builder(name("Flu")).age_range(1, 2).build().unwrap();
        assert!(model
            .preview_vaccination_change(&ValueChange::deleted(stale))
            .unwrap_err()
            .is_invalid());

        let missing = VaxType::builder(name("Measles")).build().unwrap();
        assert!(model
            .preview_vaccination_change(&ValueChange::deleted(missing))
            .unwrap_err()
            .is_not_found());
    }

    fn candidate(vaccines: &[&str]) -> Patient {
        Patient::new(
            "Bo",
            "999",
            NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
            BloodType::APositive,
        )
        .unwrap()
        .with_vaccines(vaccines.iter().map(|v| name(v)))
    }

    #[test]
    fn test_creation_must_carry_next_identity() {
        let model = seeded();
        let next = model.patients().next_id();

        let effects = model
            .preview_patient_change(&ValueChange::created(IdData::new(next, candidate(&[]))))
            .unwrap();
        assert!(effects.is_empty());

        for id in [next + 4, next - 1] {
            let err = model
                .preview_patient_change(&ValueChange::created(IdData::new(id, candidate(&[]))))
                .unwrap_err();
            assert!(err.is_invalid() || err.is_duplicate());
        }
    }

    #[test]
    fn test_retired_identity_rejected() {
        let mut model = seeded();
        let retired = model.add_patient(candidate(&[])).unwrap().value().unwrap().id();
        model.delete_patient(retired).unwrap();

        let err = model
            .preview_patient_change(&ValueChange::created(IdData::new(retired, candidate(&[]))))
            .unwrap_err();
        assert!(err.is_invalid());
    }

    #[test]
    fn test_unresolved_groups_rejected() {
        let model = seeded();
        let next = model.patients().next_id();
        let err = model
            .preview_patient_change(&ValueChange::created(IdData::new(
                next,
                candidate(&["Measles"]),
            )))
            .unwrap_err();
        assert!(err.is_not_found());

        let current = model.patients().get(0).unwrap().clone();
        let edited = current.with_value(candidate(&["Measles"]));
        assert!(model
            .validate_patient_change(&ValueChange::edited(current, edited))
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_colliding_creation_rejected() {
        let model = seeded();
        let flu = VaxType::builder(name("Flu")).build().unwrap();
        assert!(model
            .preview_vaccination_change(&ValueChange::created(flu))
            .unwrap_err()
            .is_duplicate());

        let patient = model.patients().get(0).unwrap().clone();
        assert!(model
            .preview_patient_change(&ValueChange::created(patient))
            .unwrap_err()
            .is_duplicate());
    }
}
