//! Tests for fixed- and variable-width section lists
//!
//! These tests verify:
//! - get(i).index() == i over a full write-then-read round trip
//! - OutOfRange on bad indexes, with intact state afterwards
//! - range(i, n) equals n sequential gets, in ascending index order
//! - One pooled reader per traversal, released even on early abandonment
//! - Eager materialization of the small sections

mod common;

use devicedb::entity::Entity;
use devicedb::list::SectionList;
use devicedb::{FormatVersion, StoreError};

// =============================================================================
// Fixed-Width Lists
// =============================================================================

#[test]
fn test_fixed_get_round_trips_every_index() {
    let store = common::sample_store(FormatVersion::V31);
    let values = store.values();

    assert_eq!(values.count(), 4);
    for i in 0..values.count() {
        let value = values.get(i).unwrap();
        assert_eq!(value.index(), i);
        // The sample file writes no descriptions or URLs
        assert!(!value.has_description());
        assert!(!value.has_url());
    }
}

#[test]
fn test_property_value_ranges() {
    let store = common::sample_store(FormatVersion::V31);

    let model = store.properties().get(0).unwrap();
    assert_eq!(model.value_count(), 2);
    let browser = store.properties().get(1).unwrap();
    assert_eq!(browser.first_value_index, 2);
    assert_eq!(browser.value_count(), 2);
}

#[test]
fn test_fixed_get_out_of_range() {
    let store = common::sample_store(FormatVersion::V31);
    let values = store.values();

    let result = values.get(values.count());
    assert!(matches!(
        result,
        Err(StoreError::OutOfRange { index: 4, count: 4 })
    ));

    // A failed lookup leaves the list usable
    assert!(values.get(0).is_ok());
}

#[test]
fn test_fixed_range_matches_sequential_gets() {
    let store = common::sample_store(FormatVersion::V32);
    let signatures = store.signatures();

    let ranged: Vec<_> = signatures
        .range(0, signatures.count())
        .unwrap()
        .map(|r| r.unwrap())
        .collect();
    assert_eq!(ranged.len(), signatures.count() as usize);

    for (i, entity) in ranged.iter().enumerate() {
        let direct = signatures.get(i as u32).unwrap();
        assert_eq!(entity.index(), i as u32);
        assert_eq!(**entity, *direct);
    }

    // Ascending index order
    for pair in ranged.windows(2) {
        assert!(pair[0].index() < pair[1].index());
    }
}

#[test]
fn test_fixed_range_rejects_overrun() {
    let store = common::sample_store(FormatVersion::V31);
    let values = store.values();

    assert!(matches!(
        values.range(2, 3),
        Err(StoreError::OutOfRange { .. })
    ));
    assert!(values.range(2, 2).is_ok());
    // Empty range at the end is valid
    assert_eq!(values.range(4, 0).unwrap().count(), 0);
}

#[test]
fn test_range_is_restartable() {
    let store = common::sample_store(FormatVersion::V31);
    let values = store.values();

    let first: Vec<u32> = values
        .range(1, 2)
        .unwrap()
        .map(|r| r.unwrap().index())
        .collect();
    let second: Vec<u32> = values
        .range(1, 2)
        .unwrap()
        .map(|r| r.unwrap().index())
        .collect();
    assert_eq!(first, vec![1, 2]);
    assert_eq!(first, second);
}

// =============================================================================
// Reader Discipline
// =============================================================================

#[test]
fn test_abandoned_range_releases_its_reader() {
    let store = common::sample_store(FormatVersion::V31);
    let values = store.values();

    {
        let mut range = values.range(0, 4).unwrap();
        // Consume one entry, then abandon the traversal
        range.next().unwrap().unwrap();
    }

    // The traversal's reader went back to the pool
    assert_eq!(store.idle_readers(), store.readers_created());
}

#[test]
fn test_interleaved_ranges_use_independent_readers() {
    let store = common::sample_store(FormatVersion::V31);
    let values = store.values();

    let mut a = values.range(0, 4).unwrap();
    let mut b = values.range(0, 4).unwrap();

    // Interleaving two live traversals must not cross their cursors
    assert_eq!(a.next().unwrap().unwrap().index(), 0);
    assert_eq!(b.next().unwrap().unwrap().index(), 0);
    assert_eq!(a.next().unwrap().unwrap().index(), 1);
    assert_eq!(b.next().unwrap().unwrap().index(), 1);

    drop(a);
    drop(b);
    assert_eq!(store.idle_readers(), store.readers_created());
}

// =============================================================================
// Materialized Sections
// =============================================================================

#[test]
fn test_small_sections_are_materialized_at_load() {
    let store = common::sample_store(FormatVersion::V32);

    assert!(store.components().is_materialized());
    assert!(store.maps().is_materialized());
    assert!(store.properties().is_materialized());
    assert!(store.root_nodes().is_materialized());
    assert!(store.profile_offsets().is_materialized());
}

#[test]
fn test_materialized_get_does_not_touch_the_pool() {
    let store = common::sample_store(FormatVersion::V32);
    let created_after_load = store.readers_created();

    for i in 0..store.components().count() {
        store.components().get(i).unwrap();
    }
    for i in 0..store.profile_offsets().count() {
        store.profile_offsets().get(i).unwrap();
    }

    assert_eq!(store.readers_created(), created_after_load);
}

// =============================================================================
// Variable-Width Lists
// =============================================================================

#[test]
fn test_variable_get_by_offset() {
    let sample = common::sample_file(FormatVersion::V31);
    let store = devicedb::Store::from_bytes(sample.bytes).unwrap();

    for (i, &offset) in sample.profile_offsets.iter().enumerate() {
        // The profile-offsets section is the index into the profile section
        let entry = store.profile_offsets().get(i as u32).unwrap();
        assert_eq!(entry.offset, offset);

        let profile = store.profiles().get(offset).unwrap();
        assert_eq!(profile.index(), offset);
        assert_eq!(profile.profile_id, entry.profile_id);
        // Profile ids were assigned 1001, 1002, 2001, 2002 in add order
        let expected_id = if i < 2 { 1001 + i as u32 } else { 1999 + i as u32 };
        assert_eq!(profile.profile_id, expected_id);
    }
}

#[test]
fn test_root_nodes_point_into_the_node_section() {
    let sample = common::sample_file(FormatVersion::V32);
    let store = devicedb::Store::from_bytes(sample.bytes).unwrap();

    for (i, &offset) in sample.node_offsets.iter().enumerate() {
        let root = store.root_nodes().get(i as u32).unwrap();
        assert_eq!(root.value, offset);

        let node = store.nodes().get(root.value).unwrap();
        assert_eq!(node.index(), offset);
    }
}

#[test]
fn test_variable_get_out_of_region() {
    let store = common::sample_store(FormatVersion::V31);

    let result = store.profiles().get(u32::MAX - 1);
    assert!(matches!(result, Err(StoreError::OutOfRange { .. })));
}

#[test]
fn test_variable_range_walks_consecutive_records() {
    let sample = common::sample_file(FormatVersion::V31);
    let store = devicedb::Store::from_bytes(sample.bytes).unwrap();

    let profiles: Vec<_> = store
        .profiles()
        .range(0, store.profiles().count())
        .unwrap()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(profiles.len(), 4);
    for (profile, &offset) in profiles.iter().zip(&sample.profile_offsets) {
        assert_eq!(profile.index(), offset);
    }
    assert_eq!(store.idle_readers(), store.readers_created());
}

#[test]
fn test_variable_range_overrun_errors_mid_traversal() {
    let store = common::sample_store(FormatVersion::V31);

    // Ask for one more record than the section holds
    let results: Vec<_> = store
        .profiles()
        .range(0, store.profiles().count() + 1)
        .unwrap()
        .collect();

    assert_eq!(results.len() as u32, store.profiles().count() + 1);
    assert!(results[..results.len() - 1].iter().all(|r| r.is_ok()));
    assert!(matches!(
        results.last(),
        Some(Err(StoreError::OutOfRange { .. }))
    ));
    // The failed traversal still returned its reader
    assert_eq!(store.idle_readers(), store.readers_created());
}

#[test]
fn test_string_lookups_by_recorded_offsets() {
    let sample = common::sample_file(FormatVersion::V32);
    let store = devicedb::Store::from_bytes(sample.bytes).unwrap();

    let names = [
        "Hardware", "Software", "Model", "Browser", "Phone", "Tablet", "Chrome/120", "Safari/17",
    ];
    for (&offset, &expected) in sample.string_offsets.iter().zip(&names) {
        let string = store.strings().get(offset).unwrap();
        assert_eq!(string.as_str(), expected);
    }
}
