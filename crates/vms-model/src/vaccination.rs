//! Vaccination types and the requirements they place on patients.

use crate::group_name::GroupName;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use vms_core::{Filterable, StoreError};

/// How a [`Requirement`] relates its groups to a patient's set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RequirementKind {
    /// Every group must be present.
    All,
    /// At least one group must be present.
    Any,
    /// No group may be present.
    None,
}

/// A condition over a set of group names, e.g. "no allergy to any of
/// {Egg, Gelatin}" or "has received all of {Dose 1}".
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RequirementRaw")]
pub struct Requirement {
    kind: RequirementKind,
    groups: BTreeSet<GroupName>,
}

#[derive(Deserialize)]
struct RequirementRaw {
    kind: RequirementKind,
    groups: BTreeSet<GroupName>,
}

impl TryFrom<RequirementRaw> for Requirement {
    type Error = StoreError;

    fn try_from(raw: RequirementRaw) -> Result<Self, Self::Error> {
        Requirement::new(raw.kind, raw.groups)
    }
}

impl Requirement {
    pub fn new<I>(kind: RequirementKind, groups: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = GroupName>,
    {
        let groups: BTreeSet<GroupName> = groups.into_iter().collect();
        if groups.is_empty() {
            return Err(StoreError::invalid("requirement must name at least one group"));
        }
        Ok(Self { kind, groups })
    }

    pub fn kind(&self) -> RequirementKind {
        self.kind
    }

    pub fn groups(&self) -> &BTreeSet<GroupName> {
        &self.groups
    }

    pub fn check(&self, set: &BTreeSet<GroupName>) -> bool {
        match self.kind {
            RequirementKind::All => self.groups.is_subset(set),
            RequirementKind::Any => !self.groups.is_disjoint(set),
            RequirementKind::None => self.groups.is_disjoint(set),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let groups: Vec<&str> = self.groups.iter().map(GroupName::as_str).collect();
        write!(f, "{:?} of {{{}}}", self.kind, groups.join(", "))
    }
}

/// A vaccination type, identified by its name. Deserialization goes
/// through [`VaxTypeBuilder::build`], so stored types are validated too.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "VaxTypeRaw")]
pub struct VaxType {
    name: GroupName,
    groups: BTreeSet<GroupName>,
    min_age: u32,
    max_age: u32,
    min_spacing: u32,
    allergy_reqs: Vec<Requirement>,
    history_reqs: Vec<Requirement>,
}

#[derive(Deserialize)]
struct VaxTypeRaw {
    name: GroupName,
    #[serde(default)]
    groups: BTreeSet<GroupName>,
    min_age: u32,
    max_age: u32,
    min_spacing: u32,
    #[serde(default)]
    allergy_reqs: Vec<Requirement>,
    #[serde(default)]
    history_reqs: Vec<Requirement>,
}

impl TryFrom<VaxTypeRaw> for VaxType {
    type Error = StoreError;

    fn try_from(raw: VaxTypeRaw) -> Result<Self, Self::Error> {
        VaxType::builder(raw.name)
            .groups(raw.groups)
            .age_range(raw.min_age, raw.max_age)
            .min_spacing(raw.min_spacing)
            .allergy_reqs(raw.allergy_reqs)
            .history_reqs(raw.history_reqs)
            .build()
    }
}

impl VaxType {
    pub const DEFAULT_MIN_AGE: u32 = 0;
    pub const DEFAULT_MAX_AGE: u32 = 200;
    pub const DEFAULT_MIN_SPACING: u32 = 0;

    /// Start building a vaccination type named `name`.
    pub fn builder(name: GroupName) -> VaxTypeBuilder {
        VaxTypeBuilder::new(name)
    }

    /// A builder pre-filled with this type's attributes.
    pub fn to_builder(&self) -> VaxTypeBuilder {
        VaxTypeBuilder {
            vax: self.clone(),
        }
    }

    pub fn name(&self) -> &GroupName {
        &self.name
    }

    pub fn groups(&self) -> &BTreeSet<GroupName> {
        &self.groups
    }

    pub fn min_age(&self) -> u32 {
        self.min_age
    }

    pub fn max_age(&self) -> u32 {
        self.max_age
    }

    /// Minimum number of days between two doses.
    pub fn min_spacing(&self) -> u32 {
        self.min_spacing
    }

    pub fn allergy_reqs(&self) -> &[Requirement] {
        &self.allergy_reqs
    }

    pub fn history_reqs(&self) -> &[Requirement] {
        &self.history_reqs
    }

    /// Whether `group` names this type or one of its groups.
    pub fn references_group(&self, group: &GroupName) -> bool {
        &self.name == group || self.groups.contains(group)
    }

    /// Every group name this type makes resolvable: its own name and its
    /// groups.
    pub fn group_names(&self) -> BTreeSet<GroupName> {
        let mut names = self.groups.clone();
        names.insert(self.name.clone());
        names
    }

    pub fn is_age_eligible(&self, age: u32) -> bool {
        (self.min_age..=self.max_age).contains(&age)
    }

    /// Whether a patient aged `age` with the given allergies and vaccination
    /// history may receive this type.
    pub fn is_eligible(
        &self,
        age: u32,
        allergies: &BTreeSet<GroupName>,
        history: &BTreeSet<GroupName>,
    ) -> bool {
        self.is_age_eligible(age)
            && self.allergy_reqs.iter().all(|req| req.check(allergies))
            && self.history_reqs.iter().all(|req| req.check(history))
    }
}

impl Filterable for VaxType {
    type Target = VaxType;

    fn target(&self) -> &VaxType {
        self
    }
}

impl fmt::Display for VaxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (ages {}-{})", self.name, self.min_age, self.max_age)
    }
}

/// Builder for [`VaxType`]. Validation happens once, in [`build`](Self::build).
#[derive(Clone, Debug)]
pub struct VaxTypeBuilder {
    vax: VaxType,
}

impl VaxTypeBuilder {
    pub fn new(name: GroupName) -> Self {
        Self {
            vax: VaxType {
                name,
                groups: BTreeSet::new(),
                min_age: VaxType::DEFAULT_MIN_AGE,
                max_age: VaxType::DEFAULT_MAX_AGE,
                min_spacing: VaxType::DEFAULT_MIN_SPACING,
                allergy_reqs: Vec::new(),
                history_reqs: Vec::new(),
            },
        }
    }

    /// The name the built type will carry.
    pub fn target_name(&self) -> &GroupName {
        &self.vax.name
    }

    pub fn name(mut self, name: GroupName) -> Self {
        self.vax.name = name;
        self
    }

    pub fn groups<I>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = GroupName>,
    {
        self.vax.groups = groups.into_iter().collect();
        self
    }

    pub fn group(mut self, group: GroupName) -> Self {
        self.vax.groups.insert(group);
        self
    }

    pub fn min_age(mut self, age: u32) -> Self {
        self.vax.min_age = age;
        self
    }

    pub fn max_age(mut self, age: u32) -> Self {
        self.vax.max_age = age;
        self
    }

    pub fn age_range(self, min: u32, max: u32) -> Self {
        self.min_age(min).max_age(max)
    }

    pub fn min_spacing(mut self, days: u32) -> Self {
        self.vax.min_spacing = days;
        self
    }

    pub fn allergy_reqs(mut self, reqs: Vec<Requirement>) -> Self {
        self.vax.allergy_reqs = reqs;
        self
    }

    pub fn allergy_req(mut self, req: Requirement) -> Self {
        self.vax.allergy_reqs.push(req);
        self
    }

    pub fn history_reqs(mut self, reqs: Vec<Requirement>) -> Self {
        self.vax.history_reqs = reqs;
        self
    }

    pub fn history_req(mut self, req: Requirement) -> Self {
        self.vax.history_reqs.push(req);
        self
    }

    pub fn build(self) -> Result<VaxType, StoreError> {
        let vax = self.vax;
        if vax.max_age > VaxType::DEFAULT_MAX_AGE {
            return Err(StoreError::invalid(format!(
                "{}: maximum age {} exceeds {}",
                vax.name,
                vax.max_age,
                VaxType::DEFAULT_MAX_AGE
            )));
        }
        if vax.min_age > vax.max_age {
            return Err(StoreError::invalid(format!(
                "{}: minimum age {} is above maximum age {}",
                vax.name, vax.min_age, vax.max_age
            )));
        }
        Ok(vax)
    }
}
