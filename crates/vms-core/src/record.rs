//! Identity-tagged records.
//!
//! A record pairs a value with the integer identity its map allocated for it.
//! The identity is fixed at construction: the only way to "change" a record
//! is to build a new one with [`IdData::with_value`], which keeps the id.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer identity allocated by an [`IdDataMap`](crate::IdDataMap).
pub type Id = u64;

/// A value paired with a stable, map-scoped identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdData<T> {
    id: Id,
    value: T,
}

impl<T> IdData<T> {
    pub fn new(id: Id, value: T) -> Self {
        Self { id, value }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    /// A record with the same identity holding `value`.
    pub fn with_value(&self, value: T) -> Self {
        Self { id: self.id, value }
    }
}

impl<T: fmt::Display> fmt::Display for IdData<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.id, self.value)
    }
}

/// Gives a [`FilteredView`](crate::FilteredView) access to the payload its
/// predicates test, so a predicate written for `Patient` also filters a map
/// of `IdData<Patient>`.
pub trait Filterable {
    type Target;

    fn target(&self) -> &Self::Target;
}

impl<T> Filterable for IdData<T> {
    type Target = T;

    fn target(&self) -> &T {
        &self.value
    }
}
