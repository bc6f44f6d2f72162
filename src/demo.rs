//! Scripted walkthrough: book a patient for a vaccination, delete the
//! vaccination, and show what the cascade did.

use chrono::{Duration, NaiveDate};
use vms_model::{predicates, Appointment, BloodType, GroupName, Patient, ValueChange, VaxType};
use vms_sdk::{Session, SessionConfigBuilder};

pub fn run() -> anyhow::Result<()> {
    let config = SessionConfigBuilder::new().operator("demo").build();
    let session = Session::new(config);

    let flu = GroupName::new("Flu")?;
    let covid = GroupName::new("COVID")?;
    session.add_vaccination(VaxType::builder(flu.clone()).age_range(5, 120).build()?)?;
    session.add_vaccination(
        VaxType::builder(GroupName::new("Pfizer (Dose 1)")?)
            .group(covid.clone())
            .age_range(12, 200)
            .build()?,
    )?;

    let dob = NaiveDate::from_ymd_opt(1990, 4, 12)
        .ok_or_else(|| anyhow::anyhow!("invalid date"))?;
    let alex = session
        .add_patient(
            Patient::new("Alex Yeoh", "87438807", dob, BloodType::APositive)?
                .with_vaccines([flu.clone(), covid.clone()]),
        )?
        .change;
    let alex_id = alex
        .new()
        .map(|record| record.id())
        .ok_or_else(|| anyhow::anyhow!("patient was not created"))?;
    session.add_patient(Patient::new("Bernice Yu", "99272758", dob, BloodType::ONegative)?)?;

    let start = NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .ok_or_else(|| anyhow::anyhow!("invalid date"))?;
    let end = start + Duration::minutes(30);
    session.add_appointment(Appointment::new(alex_id, flu.clone(), start, end)?)?;
    session.set_detailed_patient(Some(alex_id))?;
    session.set_patient_filters(vec![predicates::has_vaccine(flu.clone())])?;

    print_state(&session, "Before");

    let flu_type = session
        .read()
        .vax_types()
        .get(&flu)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("Flu is missing"))?;
    println!("\nDeleting {} would:", flu);
    let candidate = ValueChange::deleted(flu_type);
    for message in session.validate_vaccination_change(&candidate)? {
        println!("  - {}", message);
    }

    let committed = session.delete_vaccination(&flu)?;
    println!("\nDeleted {} ({} cascaded changes)", flu, committed.cascaded.len());
    print_state(&session, "After");

    println!("\nSnapshot:\n{}", session.snapshot().to_json()?);
    Ok(())
}

fn print_state(session: &Session, label: &str) {
    let model = session.read();
    println!("\n== {} (revision {}) ==", label, model.revision());
    for vax in model.vax_types().values() {
        println!("  vaccination  {}", vax);
    }
    for patient in model.patients().iter() {
        let vaccines: Vec<&str> = patient
            .value()
            .vaccines()
            .iter()
            .map(GroupName::as_str)
            .collect();
        println!("  patient      {} vaccines=[{}]", patient, vaccines.join(", "));
    }
    for appt in model.appointments().iter() {
        println!("  appointment  {}", appt);
    }
    println!(
        "  filtered patients: {} | detailed: {}",
        model.filtered_patients().len(),
        model
            .detailed_patient()
            .map(|p| p.value().name().to_string())
            .unwrap_or_else(|| "-".to_string())
    );
}
