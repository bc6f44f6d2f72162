//! Patients and their blood types.

use crate::group_name::GroupName;
use crate::storage::StorageModel;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use vms_core::StoreError;

/// Manager for patients, keyed by allocated integer identity.
pub type PatientManager = StorageModel<Patient>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BloodType {
    APositive,
    ANegative,
    BPositive,
    BNegative,
    AbPositive,
    AbNegative,
    OPositive,
    ONegative,
}

impl BloodType {
    pub const ALL: [BloodType; 8] = [
        BloodType::APositive,
        BloodType::ANegative,
        BloodType::BPositive,
        BloodType::BNegative,
        BloodType::AbPositive,
        BloodType::AbNegative,
        BloodType::OPositive,
        BloodType::ONegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BloodType::APositive => "A+",
            BloodType::ANegative => "A-",
            BloodType::BPositive => "B+",
            BloodType::BNegative => "B-",
            BloodType::AbPositive => "AB+",
            BloodType::AbNegative => "AB-",
            BloodType::OPositive => "O+",
            BloodType::ONegative => "O-",
        }
    }
}

impl FromStr for BloodType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_uppercase();
        BloodType::ALL
            .into_iter()
            .find(|bt| bt.as_str() == wanted)
            .ok_or_else(|| StoreError::invalid(format!("unknown blood type {:?}", s)))
    }
}

impl TryFrom<String> for BloodType {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BloodType> for String {
    fn from(bt: BloodType) -> Self {
        bt.as_str().to_string()
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A patient record. Allergies and vaccines hold group names, which are
/// soft references into the vaccination types.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PatientRaw")]
pub struct Patient {
    name: String,
    phone: String,
    dob: NaiveDate,
    blood_type: BloodType,
    allergies: BTreeSet<GroupName>,
    vaccines: BTreeSet<GroupName>,
}

#[derive(Deserialize)]
struct PatientRaw {
    name: String,
    phone: String,
    dob: NaiveDate,
    blood_type: BloodType,
    #[serde(default)]
    allergies: BTreeSet<GroupName>,
    #[serde(default)]
    vaccines: BTreeSet<GroupName>,
}

impl TryFrom<PatientRaw> for Patient {
    type Error = StoreError;

    fn try_from(raw: PatientRaw) -> Result<Self, Self::Error> {
        Ok(Patient::new(raw.name, raw.phone, raw.dob, raw.blood_type)?
            .with_allergies(raw.allergies)
            .with_vaccines(raw.vaccines))
    }
}

impl Patient {
    pub const MIN_PHONE_DIGITS: usize = 3;

    pub fn new(
        name: impl Into<String>,
        phone: impl Into<String>,
        dob: NaiveDate,
        blood_type: BloodType,
    ) -> Result<Self, StoreError> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(StoreError::invalid("patient name must not be empty"));
        }
        let phone = phone.into().trim().to_string();
        if phone.len() < Self::MIN_PHONE_DIGITS || !phone.chars().all(|c| c.is_ascii_digit()) {
            return Err(StoreError::invalid(format!(
                "phone {:?} must be at least {} digits",
                phone,
                Self::MIN_PHONE_DIGITS
            )));
        }
        Ok(Self {
            name,
            phone,
            dob,
            blood_type,
            allergies: BTreeSet::new(),
            vaccines: BTreeSet::new(),
        })
    }

    pub fn with_allergies<I>(mut self, allergies: I) -> Self
    where
        I: IntoIterator<Item = GroupName>,
    {
        self.allergies = allergies.into_iter().collect();
        self
    }

    pub fn with_vaccines<I>(mut self, vaccines: I) -> Self
    where
        I: IntoIterator<Item = GroupName>,
    {
        self.vaccines = vaccines.into_iter().collect();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn dob(&self) -> NaiveDate {
        self.dob
    }

    pub fn blood_type(&self) -> BloodType {
        self.blood_type
    }

    pub fn allergies(&self) -> &BTreeSet<GroupName> {
        &self.allergies
    }

    pub fn vaccines(&self) -> &BTreeSet<GroupName> {
        &self.vaccines
    }

    /// Whether any of `groups` appears in the allergies or vaccines.
    pub fn references_any(&self, groups: &BTreeSet<GroupName>) -> bool {
        !self.allergies.is_disjoint(groups) || !self.vaccines.is_disjoint(groups)
    }

    /// This patient with every name in `groups` dropped from its allergies
    /// and vaccines, or `None` if nothing would change.
    /// Every group name the patient holds, allergies first.
    pub fn group_refs(&self) -> impl Iterator<Item = &GroupName> + '_ {
        self.allergies.iter().chain(self.vaccines.iter())
    }

    pub fn without_groups(&self, groups: &BTreeSet<GroupName>) -> Option<Patient> {
        if !self.references_any(groups) {
            return None;
        }
        let mut patient = self.clone();
        patient.allergies.retain(|g| !groups.contains(g));
        patient.vaccines.retain(|g| !groups.contains(g));
        Some(patient)
    }

    /// Age in whole years on `date`; zero for dates before birth.
    pub fn age_on(&self, date: NaiveDate) -> u32 {
        date.years_since(self.dob).unwrap_or(0)
    }

    pub fn birth_year(&self) -> i32 {
        self.dob.year()
    }
}

impl fmt::Display for Patient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, born {}, {})",
            self.name, self.phone, self.dob, self.blood_type
        )
    }
}
