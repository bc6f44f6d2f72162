//! # vms-core
//!
//! Storage primitives for the VMS working-set store.
//!
//! This crate provides:
//! - Identity maps: insertion-ordered, generic over the key type
//! - A sequential allocator that never reuses an integer identity
//! - Transition records describing one committed change
//! - Filtered views recomputed from the backing map's revision
//!
//! ## Example
//!
//! ```rust
//! use vms_core::{predicate, FilteredView, IdData, IdDataMap};
//!
//! let mut patients = IdDataMap::new();
//! let alice = patients.add("Alice".to_string());
//! patients.add("Bob".to_string());
//!
//! let mut view: FilteredView<u64, IdData<String>> = FilteredView::new();
//! view.set_filter(predicate(|name: &String| name.starts_with('A')));
//! view.sync(patients.as_map());
//!
//! let visible = view.view(patients.as_map());
//! assert_eq!(visible.keys(), vec![alice.id()]);
//! ```

pub mod change;
pub mod error;
pub mod filter;
pub mod id_map;
pub mod record;

pub use change::{ChangeKind, ValueChange};
pub use error::{Result, StoreError};
pub use filter::{predicate, show_all, FilteredMap, FilteredView, Predicate};
pub use id_map::{IdDataMap, IdentityMap};
pub use record::{Filterable, Id, IdData};
