//! Ready-made filter predicates for the orchestrator's views.

use crate::appointment::Appointment;
use crate::group_name::GroupName;
use crate::patient::{BloodType, Patient};
use crate::vaccination::VaxType;
use chrono::NaiveDate;
use vms_core::{predicate, Id, Predicate};

/// Patients whose name contains any of `keywords` as a whole word,
/// ignoring case.
pub fn name_contains_keywords<I, S>(keywords: I) -> Predicate<Patient>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let keywords: Vec<String> = keywords
        .into_iter()
        .map(|k| k.as_ref().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();
    predicate(move |patient: &Patient| {
        patient
            .name()
            .split_whitespace()
            .any(|word| keywords.contains(&word.to_lowercase()))
    })
}

pub fn phone_is(phone: impl Into<String>) -> Predicate<Patient> {
    let phone = phone.into();
    predicate(move |patient: &Patient| patient.phone() == phone)
}

pub fn dob_is(dob: NaiveDate) -> Predicate<Patient> {
    predicate(move |patient: &Patient| patient.dob() == dob)
}

pub fn blood_type_is(blood_type: BloodType) -> Predicate<Patient> {
    predicate(move |patient: &Patient| patient.blood_type() == blood_type)
}

pub fn has_allergy(group: GroupName) -> Predicate<Patient> {
    predicate(move |patient: &Patient| patient.allergies().contains(&group))
}

pub fn has_vaccine(group: GroupName) -> Predicate<Patient> {
    predicate(move |patient: &Patient| patient.vaccines().contains(&group))
}

/// Vaccination types whose name contains `fragment`, ignoring case.
pub fn vax_name_contains(fragment: impl Into<String>) -> Predicate<VaxType> {
    let fragment = fragment.into().to_lowercase();
    predicate(move |vax: &VaxType| vax.name().as_str().to_lowercase().contains(&fragment))
}

pub fn vax_in_group(group: GroupName) -> Predicate<VaxType> {
    predicate(move |vax: &VaxType| vax.references_group(&group))
}

/// Vaccination types a patient of `age` could receive on age alone.
pub fn vax_accepts_age(age: u32) -> Predicate<VaxType> {
    predicate(move |vax: &VaxType| vax.is_age_eligible(age))
}

pub fn appointment_for_patient(patient_id: Id) -> Predicate<Appointment> {
    predicate(move |appt: &Appointment| appt.patient_id() == patient_id)
}

pub fn appointment_for_vaccination(vaccination: GroupName) -> Predicate<Appointment> {
    predicate(move |appt: &Appointment| appt.vaccination() == &vaccination)
}

pub fn appointment_completed(completed: bool) -> Predicate<Appointment> {
    predicate(move |appt: &Appointment| appt.is_completed() == completed)
}
