//! Storage model - the domain-typed wrapper every integer-keyed manager
//! is built on.
//!
//! Mutators return transition records so the caller can hand them to the
//! cascade. Calling them directly (rather than through
//! [`ModelManager`](crate::ModelManager)) skips cascade maintenance and is
//! meant for bulk loading.

use vms_core::{Id, IdData, IdDataMap, IdentityMap, Result, ValueChange};

#[derive(Clone, Debug, PartialEq)]
pub struct StorageModel<T> {
    data: IdDataMap<T>,
}

impl<T: Clone> StorageModel<T> {
    pub fn new() -> Self {
        Self {
            data: IdDataMap::new(),
        }
    }

    /// A storage model holding `records` under their own identities.
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = IdData<T>>,
    {
        let mut model = Self::new();
        model.reset_data(records)?;
        Ok(model)
    }

    pub fn contains(&self, id: Id) -> bool {
        self.data.contains(id)
    }

    pub fn get(&self, id: Id) -> Option<&IdData<T>> {
        self.data.get(id)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &IdData<T>> + '_ {
        self.data.iter()
    }

    pub fn revision(&self) -> u64 {
        self.data.revision()
    }

    pub fn next_id(&self) -> Id {
        self.data.next_id()
    }

    /// Move the allocator forward to at least `next`, so identities handed
    /// out by another model are never allocated here.
    pub fn advance_to(&mut self, next: Id) {
        self.data.advance_to(next);
    }

    pub fn add(&mut self, value: T) -> ValueChange<IdData<T>> {
        ValueChange::created(self.data.add(value))
    }

    /// Add a record under its own identity, replacing whatever was there.
    pub fn add_record(&mut self, record: IdData<T>) -> ValueChange<IdData<T>> {
        match self.data.add_record(record.clone()) {
            Some(previous) => ValueChange::edited(previous, record),
            None => ValueChange::created(record),
        }
    }

    pub fn set(&mut self, id: Id, value: T) -> Result<ValueChange<IdData<T>>> {
        self.data.set(id, value)
    }

    pub fn remove(&mut self, id: Id) -> Result<ValueChange<IdData<T>>> {
        self.data.remove(id).map(ValueChange::deleted)
    }

    /// Replace the contents, assigning fresh identities in order.
    pub fn replace_values<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.data.replace_values(values);
    }

    /// Replace the contents, preserving the identities of `records`.
    pub fn reset_data<I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = IdData<T>>,
    {
        self.data.replace_records(records)
    }

    /// Read-only projection of the backing map.
    pub fn map_view(&self) -> &IdentityMap<Id, IdData<T>> {
        self.data.as_map()
    }

    pub fn records(&self) -> Vec<IdData<T>> {
        self.data.records()
    }
}

impl<T: Clone> Default for StorageModel<T> {
    fn default() -> Self {
        Self::new()
    }
}
