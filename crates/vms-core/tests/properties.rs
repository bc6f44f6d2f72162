//! Property-based tests for the storage primitives
//!
//! These tests verify the laws every store relies on:
//!  - Identities are unique and never reused within a map's lifetime
//!  - A filter shows exactly the entries its predicate accepts
//!  - Restoring a snapshot reproduces identities and order

use proptest::prelude::*;
use std::collections::HashSet;
use vms_core::{predicate, FilteredView, IdData, IdDataMap};

#[derive(Clone, Debug)]
enum Op {
    Add(i32),
    Remove(usize),
    Set(usize, i32),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0i32..1000).prop_map(Op::Add),
        (0usize..50).prop_map(Op::Remove),
        (0usize..50, 0i32..1000).prop_map(|(i, v)| Op::Set(i, v)),
    ]
}

fn apply(map: &mut IdDataMap<i32>, ops: &[Op]) -> Vec<u64> {
    let mut allocated = Vec::new();
    for op in ops {
        match op {
            Op::Add(value) => allocated.push(map.add(*value).id()),
            Op::Remove(index) => {
                let ids: Vec<u64> = map.iter().map(IdData::id).collect();
                if let Some(id) = ids.get(index % ids.len().max(1)) {
                    map.remove(*id).unwrap();
                }
            }
            Op::Set(index, value) => {
                let ids: Vec<u64> = map.iter().map(IdData::id).collect();
                if let Some(id) = ids.get(index % ids.len().max(1)) {
                    map.set(*id, *value).unwrap();
                }
            }
        }
    }
    allocated
}

proptest! {
    #[test]
    fn identities_are_never_reused(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let mut map = IdDataMap::new();
        let allocated = apply(&mut map, &ops);

        let unique: HashSet<_> = allocated.iter().collect();
        prop_assert_eq!(unique.len(), allocated.len());
        prop_assert!(allocated.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn add_then_contains_remove_then_absent(values in prop::collection::vec(0i32..100, 1..20)) {
        let mut map = IdDataMap::new();
        for value in values {
            let record = map.add(value);
            prop_assert!(map.contains(record.id()));
            map.remove(record.id()).unwrap();
            prop_assert!(!map.contains(record.id()));
        }
    }

    #[test]
    fn filter_shows_exactly_accepted_entries(
        values in prop::collection::vec(-100i32..100, 0..40),
        threshold in -100i32..100
    ) {
        let mut map = IdDataMap::new();
        map.replace_values(values.clone());

        let mut view: FilteredView<u64, IdData<i32>> = FilteredView::new();
        view.set_filter(predicate(move |v: &i32| *v >= threshold));
        view.sync(map.as_map());

        let visible: Vec<i32> = view
            .view(map.as_map())
            .to_vec()
            .into_iter()
            .map(IdData::into_value)
            .collect();
        let expected: Vec<i32> = values.into_iter().filter(|v| *v >= threshold).collect();
        prop_assert_eq!(visible, expected);
    }

    #[test]
    fn empty_filter_set_shows_everything(values in prop::collection::vec(0i32..100, 0..40)) {
        let mut map = IdDataMap::new();
        map.replace_values(values);

        let mut view: FilteredView<u64, IdData<i32>> = FilteredView::new();
        view.set_filter(predicate(|_: &i32| false));
        view.set_filters(Vec::new());
        view.sync(map.as_map());

        prop_assert_eq!(view.view(map.as_map()).len(), map.len());
    }

    #[test]
    fn snapshot_round_trip(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut source = IdDataMap::new();
        apply(&mut source, &ops);
        let snapshot = source.records();

        let mut restored = IdDataMap::new();
        restored.replace_records(snapshot.clone()).unwrap();

        prop_assert_eq!(restored.records(), snapshot);
        prop_assert!(restored.iter().all(|r| r.id() < restored.next_id()));
    }

    #[test]
    fn snapshot_survives_json(values in prop::collection::vec(0i32..100, 0..20)) {
        let mut map = IdDataMap::new();
        map.replace_values(values);

        let json = serde_json::to_string(&map.records()).unwrap();
        let back: Vec<IdData<i32>> = serde_json::from_str(&json).unwrap();

        prop_assert_eq!(back, map.records());
    }
}
