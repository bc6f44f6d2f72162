//! Vaccination-type manager, keyed by the type's name.

use crate::group_name::GroupName;
use crate::vaccination::VaxType;
use vms_core::{IdentityMap, Result, StoreError, ValueChange};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VaxTypeManager {
    types: IdentityMap<GroupName, VaxType>,
}

impl VaxTypeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &GroupName) -> Option<&VaxType> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &GroupName) -> bool {
        self.types.contains(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.types.revision()
    }

    pub fn values(&self) -> impl Iterator<Item = &VaxType> + '_ {
        self.types.values()
    }

    /// True when `group` is the name of a vaccination type or belongs to
    /// one's groups.
    pub fn resolves(&self, group: &GroupName) -> bool {
        self.types.contains(group) || self.types.values().any(|vax| vax.groups().contains(group))
    }

    pub fn add(&mut self, vax: VaxType) -> Result<ValueChange<VaxType>> {
        self.types.insert(vax.name().clone(), vax.clone())?;
        Ok(ValueChange::created(vax))
    }

    /// Replace the type stored under `name`. The replacement must keep the
    /// name; a rename is a remove followed by an add.
    pub fn set(&mut self, name: &GroupName, vax: VaxType) -> Result<ValueChange<VaxType>> {
        if !self.types.contains(name) {
            return Err(StoreError::not_found(name));
        }
        if vax.name() != name {
            return Err(StoreError::invalid(format!(
                "cannot rename {} to {} in place",
                name,
                vax.name()
            )));
        }
        self.types.set(name, vax)
    }

    pub fn remove(&mut self, name: &GroupName) -> Result<ValueChange<VaxType>> {
        self.types.remove(name).map(ValueChange::deleted)
    }

    /// Swap in a whole new collection. Fails without touching the manager
    /// if two types share a name.
    pub fn reset_data<I>(&mut self, types: I) -> Result<()>
    where
        I: IntoIterator<Item = VaxType>,
    {
        self.types
            .replace_all(types.into_iter().map(|vax| (vax.name().clone(), vax)))
    }

    /// Read-only projection of the backing map.
    pub fn map_view(&self) -> &IdentityMap<GroupName, VaxType> {
        &self.types
    }

    pub fn records(&self) -> Vec<VaxType> {
        self.types.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> GroupName {
        GroupName::new(s).unwrap()
    }

    fn vax(s: &str, groups: &[&str]) -> VaxType {
        VaxType::builder(name(s))
            .groups(groups.iter().map(|g| name(g)))
            .build()
            .unwrap()
    }

    #[test]
    fn test_add_rejects_duplicate_name() {
        let mut manager = VaxTypeManager::new();
        manager.add(vax("Flu", &[])).unwrap();

        assert!(matches!(
            manager.add(vax("Flu", &["Seasonal"])),
            Err(StoreError::DuplicateEntity(_))
        ));
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_set_rejects_rename() {
        let mut manager = VaxTypeManager::new();
        manager.add(vax("Flu", &[])).unwrap();

        assert!(matches!(
            manager.set(&name("Flu"), vax("Influenza", &[])),
            Err(StoreError::InvalidValue(_))
        ));
        assert!(matches!(
            manager.set(&name("Measles"), vax("Measles", &[])),
            Err(StoreError::NotFound(_))
        ));

        let change = manager
            .set(&name("Flu"), vax("Flu", &["Seasonal"]))
            .unwrap();
        assert_eq!(change.old(), Some(&vax("Flu", &[])));
        assert!(manager.contains(&name("Flu")));
    }

    #[test]
    fn test_resolves_names_and_groups() {
        let mut manager = VaxTypeManager::new();
        manager.add(vax("Pfizer", &["COVID"])).unwrap();

        assert!(manager.resolves(&name("Pfizer")));
        assert!(manager.resolves(&name("COVID")));
        assert!(!manager.resolves(&name("Flu")));

        manager.remove(&name("Pfizer")).unwrap();
        assert!(!manager.resolves(&name("COVID")));
    }

    #[test]
    fn test_reset_preserves_order() {
        let mut manager = VaxTypeManager::new();
        manager
            .reset_data(vec![vax("B", &[]), vax("A", &[]), vax("C", &[])])
            .unwrap();

        let names: Vec<&str> = manager.values().map(|v| v.name().as_str()).collect();
        assert_eq!(names, vec!["B", "A", "C"]);
    }
}
