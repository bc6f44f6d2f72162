//! Events published by a session after every change to the model.

use chrono::{DateTime, Utc};
use vms_model::{EntityKind, ModelChange};

/// What happened.
#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    /// A mutation was committed.
    Committed {
        change: ModelChange,
        cascaded: Vec<ModelChange>,
    },
    /// A whole collection was swapped in.
    Reset {
        entity: EntityKind,
        changes: Vec<ModelChange>,
    },
    /// A snapshot was installed.
    Restored { retracted: Vec<ModelChange> },
    /// A view's predicate set was replaced.
    FiltersChanged { entity: EntityKind },
    /// A detail binding was selected or cleared.
    SelectionChanged { entity: EntityKind },
}

/// An event together with the model revision it produced.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelEvent {
    pub revision: u64,
    pub operator: String,
    pub at: DateTime<Utc>,
    pub kind: EventKind,
}

impl ModelEvent {
    pub fn new(revision: u64, operator: impl Into<String>, kind: EventKind) -> Self {
        Self {
            revision,
            operator: operator.into(),
            at: Utc::now(),
            kind,
        }
    }

    /// Every transition the event carries, primary first.
    pub fn changes(&self) -> Vec<&ModelChange> {
        match &self.kind {
            EventKind::Committed { change, cascaded } => {
                std::iter::once(change).chain(cascaded.iter()).collect()
            }
            EventKind::Reset { changes, .. } => changes.iter().collect(),
            EventKind::Restored { retracted } => retracted.iter().collect(),
            EventKind::FiltersChanged { .. } | EventKind::SelectionChanged { .. } => Vec::new(),
        }
    }

    /// Whether any carried transition touches `entity`.
    pub fn touches(&self, entity: EntityKind) -> bool {
        match &self.kind {
            EventKind::Reset { entity: reset, .. } if *reset == entity => true,
            EventKind::FiltersChanged { entity: e } | EventKind::SelectionChanged { entity: e } => {
                *e == entity
            }
            _ => self.changes().iter().any(|c| c.entity() == entity),
        }
    }
}
