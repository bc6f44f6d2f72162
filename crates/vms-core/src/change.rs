//! Transition records: the old/new pair describing one committed change.

use serde::{Deserialize, Serialize};

/// What a [`ValueChange`] did to its entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    Created,
    Edited,
    Deleted,
}

/// An old/new value pair. At least one side is always present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueChange<T> {
    old: Option<T>,
    new: Option<T>,
}

impl<T> ValueChange<T> {
    pub fn created(new: T) -> Self {
        Self {
            old: None,
            new: Some(new),
        }
    }

    pub fn edited(old: T, new: T) -> Self {
        Self {
            old: Some(old),
            new: Some(new),
        }
    }

    pub fn deleted(old: T) -> Self {
        Self {
            old: Some(old),
            new: None,
        }
    }

    /// Build a change from its two sides; `None` if both are absent.
    pub fn from_parts(old: Option<T>, new: Option<T>) -> Option<Self> {
        if old.is_none() && new.is_none() {
            return None;
        }
        Some(Self { old, new })
    }

    pub fn old(&self) -> Option<&T> {
        self.old.as_ref()
    }

    pub fn new(&self) -> Option<&T> {
        self.new.as_ref()
    }

    pub fn kind(&self) -> ChangeKind {
        match (&self.old, &self.new) {
            (None, _) => ChangeKind::Created,
            (Some(_), Some(_)) => ChangeKind::Edited,
            (Some(_), None) => ChangeKind::Deleted,
        }
    }

    pub fn is_deletion(&self) -> bool {
        self.kind() == ChangeKind::Deleted
    }

    pub fn into_parts(self) -> (Option<T>, Option<T>) {
        (self.old, self.new)
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> ValueChange<U> {
        ValueChange {
            old: self.old.map(&mut f),
            new: self.new.map(&mut f),
        }
    }

    /// The value a binding that currently mirrors `current` should hold after
    /// this change: `Some(next)` when `current` matches the old side, `None`
    /// when the change does not concern it.
    pub fn follow(&self, current: &T) -> Option<Option<&T>>
    where
        T: PartialEq,
    {
        match &self.old {
            Some(old) if old == current => Some(self.new.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(ValueChange::created(1).kind(), ChangeKind::Created);
        assert_eq!(ValueChange::edited(1, 2).kind(), ChangeKind::Edited);
        assert_eq!(ValueChange::deleted(1).kind(), ChangeKind::Deleted);
        assert!(ValueChange::deleted(1).is_deletion());
    }

    #[test]
    fn test_from_parts_rejects_empty() {
        assert!(ValueChange::<i32>::from_parts(None, None).is_none());
        assert_eq!(
            ValueChange::from_parts(Some(1), None),
            Some(ValueChange::deleted(1))
        );
    }

    #[test]
    fn test_follow() {
        let change = ValueChange::edited("a", "b");
        assert_eq!(change.follow(&"a"), Some(Some(&"b")));
        assert_eq!(change.follow(&"c"), None);

        let deletion = ValueChange::deleted("a");
        assert_eq!(deletion.follow(&"a"), Some(None));

        // A creation never concerns an existing binding.
        assert_eq!(ValueChange::created("a").follow(&"a"), None);
    }

    #[test]
    fn test_map() {
        let change = ValueChange::edited(1, 2).map(|v| v * 10);
        assert_eq!(change.old(), Some(&10));
        assert_eq!(change.new(), Some(&20));
    }
}
