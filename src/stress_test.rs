use async_stream::stream;
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime};
use futures::stream::Stream;
use futures::stream::StreamExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};
use tracing::{debug, info};
use vms_model::{Appointment, BloodType, GroupName, ModelManager, ModelSnapshot, Patient, VaxType};
use vms_sdk::{EventKind, Session, SessionConfigBuilder};

const GROUPS: [&str; 6] = ["Flu", "COVID", "Measles", "mRNA", "Seasonal", "Booster"];

/// Statistics collected during stress testing
#[derive(Clone, Debug)]
pub struct StressTestStats {
    pub seed: u64,
    pub steps: usize,
    pub committed: usize,
    pub rejected: usize,
    pub cascaded: usize,
    pub events_seen: usize,
    pub total_time: Duration,
    pub ops_per_second: f64,
}

impl StressTestStats {
    pub fn print(&self) {
        println!("\n╔════════════════════════════════════════════════════════════╗");
        println!("║              Stress Test Statistics                         ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║  Seed:                      {:>30} ║", self.seed);
        println!("║  Steps:                     {:>30} ║", self.steps);
        println!("║  Committed:                 {:>30} ║", self.committed);
        println!("║  Rejected:                  {:>30} ║", self.rejected);
        println!("║  Cascaded Changes:          {:>30} ║", self.cascaded);
        println!("║  Events Seen:               {:>30} ║", self.events_seen);
        println!("║  Total Time:                {:>29}s ║", format!("{:.3}", self.total_time.as_secs_f64()));
        println!("║  Operations/Second:         {:>30.0} ║", self.ops_per_second);
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

/// One randomly chosen mutation.
#[derive(Clone, Debug)]
enum Action {
    AddVax { name: usize, groups: Vec<usize> },
    EditVax { name: usize, groups: Vec<usize> },
    DeleteVax { name: usize },
    AddPatient { vaccines: Vec<usize>, allergies: Vec<usize> },
    DeletePatient { id: u64 },
    Book { patient: u64, vax: usize, day: u32 },
    Mark { id: u64 },
    Select { id: u64 },
    Snapshot,
}

fn group(index: usize) -> anyhow::Result<GroupName> {
    Ok(GroupName::new(GROUPS[index % GROUPS.len()])?)
}

fn groups(indices: &[usize]) -> anyhow::Result<Vec<GroupName>> {
    indices.iter().map(|i| group(*i)).collect()
}

fn random_groups(rng: &mut StdRng) -> Vec<usize> {
    let count = rng.gen_range(0..3);
    (0..count).map(|_| rng.gen_range(0..GROUPS.len())).collect()
}

/// Generator that yields a reproducible mutation workload
fn action_generator(seed: u64, steps: usize) -> impl Stream<Item = Action> {
    stream! {
        let mut rng = StdRng::seed_from_u64(seed);
        for _ in 0..steps {
            let id = rng.gen_range(0..64);
            let name = rng.gen_range(0..GROUPS.len());
            let action = match rng.gen_range(0..100) {
                0..=9 => Action::AddVax { name, groups: random_groups(&mut rng) },
                10..=14 => Action::EditVax { name, groups: random_groups(&mut rng) },
                15..=19 => Action::DeleteVax { name },
                20..=44 => Action::AddPatient {
                    vaccines: random_groups(&mut rng),
                    allergies: random_groups(&mut rng),
                },
                45..=54 => Action::DeletePatient { id },
                55..=84 => Action::Book { patient: id, vax: name, day: rng.gen_range(1..28) },
                85..=92 => Action::Mark { id },
                93..=97 => Action::Select { id },
                _ => Action::Snapshot,
            };
            yield action;
        }
    }
}

fn slot(day: u32) -> anyhow::Result<(NaiveDateTime, NaiveDateTime)> {
    let start = NaiveDate::from_ymd_opt(2024, 6, day)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .ok_or_else(|| anyhow::anyhow!("invalid slot day {}", day))?;
    Ok((start, start + ChronoDuration::minutes(20)))
}

/// Apply one action. Returns the number of cascaded changes, or `None` if
/// the model rejected it.
fn apply(session: &Session, action: Action, step: usize) -> anyhow::Result<Option<usize>> {
    let outcome = match action {
        Action::AddVax { name, groups: g } => {
            let vax = VaxType::builder(group(name)?).groups(groups(&g)?).build()?;
            session.add_vaccination(vax).map(|c| c.cascaded.len())
        }
        Action::EditVax { name, groups: g } => {
            let name = group(name)?;
            let builder = VaxType::builder(name.clone()).groups(groups(&g)?);
            session.edit_vaccination(&name, builder).map(|c| c.cascaded.len())
        }
        Action::DeleteVax { name } => session
            .delete_vaccination(&group(name)?)
            .map(|c| c.cascaded.len()),
        Action::AddPatient { vaccines, allergies } => {
            // Unresolved groups are rejected by the model.
            let dob = NaiveDate::from_ymd_opt(1980, 1, 1)
                .ok_or_else(|| anyhow::anyhow!("invalid date"))?;
            let name = format!("Patient {}", step);
            let patient = Patient::new(name, "91234567", dob, BloodType::OPositive)?
                .with_vaccines(groups(&vaccines)?)
                .with_allergies(groups(&allergies)?);
            session.add_patient(patient).map(|c| c.cascaded.len())
        }
        Action::DeletePatient { id } => session.delete_patient(id).map(|c| c.cascaded.len()),
        Action::Book { patient, vax, day } => {
            let (start, end) = slot(day)?;
            let appointment = Appointment::new(patient, group(vax)?, start, end)?;
            session.add_appointment(appointment).map(|c| c.cascaded.len())
        }
        Action::Mark { id } => session.mark_appointment(id).map(|c| c.cascaded.len()),
        Action::Select { id } => session.set_detailed_patient(Some(id)).map(|_| 0),
        Action::Snapshot => {
            let json = session.snapshot().to_json()?;
            let snapshot = ModelSnapshot::from_json(&json)?;
            session.restore(snapshot).map(|retracted| retracted.len())
        }
    };

    match outcome {
        Ok(cascaded) => Ok(Some(cascaded)),
        Err(err) => {
            debug!(step, %err, "rejected");
            Ok(None)
        }
    }
}

/// Check every consistency invariant the model promises readers.
pub fn check_consistency(model: &ModelManager) -> anyhow::Result<()> {
    for appt in model.appointments().iter() {
        if !model.patients().contains(appt.value().patient_id()) {
            anyhow::bail!("appointment {} references a missing patient", appt);
        }
        if !model.vax_types().contains(appt.value().vaccination()) {
            anyhow::bail!("appointment {} references a missing vaccination", appt);
        }
    }
    for patient in model.patients().iter() {
        let unresolved = patient.value().group_refs().find(|g| !model.vax_types().resolves(g));
        if let Some(group) = unresolved {
            anyhow::bail!("patient {} keeps unresolved group {}", patient, group);
        }
    }
    if let Some(shown) = model.detailed_patient() {
        if model.patients().get(shown.id()) != Some(shown) {
            anyhow::bail!("detailed patient {} is stale", shown);
        }
    }
    if let Some(shown) = model.detailed_vax_type() {
        if model.vax_types().get(shown.name()) != Some(shown) {
            anyhow::bail!("detailed vaccination {} is stale", shown.name());
        }
    }
    if model.filtered_patients().len() != model.patients().len() {
        anyhow::bail!("unfiltered patient view is out of sync");
    }
    Ok(())
}

/// Drive a session with a seeded random workload while a subscriber counts
/// the events it publishes.
pub async fn stress_test_session(steps: usize, seed: u64) -> anyhow::Result<StressTestStats> {
    println!("\n╔════════════════════════════════════════════════════════════╗");
    println!("║        Session Stress Test (Async)                         ║");
    println!("║  Steps: {} | Seed: {} ║", steps, seed);
    println!("╚════════════════════════════════════════════════════════════╝");

    let start = Instant::now();
    let config = SessionConfigBuilder::new()
        .operator("stress")
        .event_capacity(steps.max(1))
        .build();
    let session = Session::new(config);

    let mut rx = session.subscribe();
    let listener = tokio::spawn(async move {
        let mut seen = 0usize;
        let mut last_revision = 0u64;
        while let Ok(event) = rx.recv().await {
            if event.revision <= last_revision {
                return Err(anyhow::anyhow!("event revisions went backwards"));
            }
            last_revision = event.revision;
            if matches!(event.kind, EventKind::Committed { .. } | EventKind::Restored { .. }) {
                seen += 1;
            }
        }
        Ok(seen)
    });

    let mut committed = 0;
    let mut rejected = 0;
    let mut cascaded = 0;
    let mut selections = 0;
    let mut actions = Box::pin(action_generator(seed, steps));
    let mut step = 0;

    while let Some(action) = actions.next().await {
        let is_selection = matches!(action, Action::Select { .. });
        match apply(&session, action, step)? {
            Some(n) => {
                if is_selection {
                    selections += 1;
                } else {
                    committed += 1;
                }
                cascaded += n;
            }
            None => rejected += 1,
        }
        check_consistency(&session.read())
            .map_err(|e| anyhow::anyhow!("step {} (seed {}): {}", step, seed, e))?;

        step += 1;
        if step % 500 == 0 {
            info!(step, committed, rejected, "progress");
            tokio::task::yield_now().await;
        }
    }

    // Dropping the last sender ends the listener.
    drop(session);
    let events_seen = listener.await??;
    if events_seen != committed {
        anyhow::bail!(
            "saw {} commit events for {} commits ({} selections)",
            events_seen,
            committed,
            selections
        );
    }

    let total_time = start.elapsed();
    Ok(StressTestStats {
        seed,
        steps,
        committed,
        rejected,
        cascaded,
        events_seen,
        total_time,
        ops_per_second: steps as f64 / total_time.as_secs_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_workload_stays_consistent() {
        let stats = stress_test_session(300, 7).await.unwrap();
        assert_eq!(stats.steps, 300);
        assert!(stats.committed > 0);
        assert_eq!(stats.events_seen, stats.committed);
        assert!(stats.committed + stats.rejected <= 300);
    }

    #[tokio::test]
    async fn test_same_seed_same_outcome() {
        let first = stress_test_session(200, 42).await.unwrap();
        let second = stress_test_session(200, 42).await.unwrap();
        assert_eq!(first.committed, second.committed);
        assert_eq!(first.rejected, second.rejected);
        assert_eq!(first.cascaded, second.cascaded);
    }

    #[test]
    fn test_empty_model_is_consistent() {
        check_consistency(&ModelManager::new()).unwrap();
    }
}
