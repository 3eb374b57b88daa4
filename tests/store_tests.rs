//! Tests for store construction and the loader
//!
//! These tests verify:
//! - Loading from bytes and from files, both format versions
//! - Metadata capture (version, published, last-modified, temp flag)
//! - Version-matched factory selection producing equivalent entities
//! - Structural failures rejecting the whole store
//! - Temporary-file deletion on drop

mod common;

use devicedb::entity::{NodeSignatures, SignatureNodes};
use devicedb::list::SectionList;
use devicedb::{FormatVersion, Store, StoreError};
use tempfile::TempDir;

// Header layout positions used by the corruption tests
const VERSION_MARKER_POS: usize = 4;
const PRELUDE_SIZE: usize = 16;
const DESCRIPTOR_SIZE: usize = 12;

/// Rewrite the header CRC after patching header bytes, so corruption tests
/// exercise the check they target instead of tripping the CRC first
fn rewrite_header_crc(bytes: &mut [u8], version: FormatVersion) {
    let sections = match version {
        FormatVersion::V31 => 11,
        FormatVersion::V32 => 13,
    };
    let crc_pos = PRELUDE_SIZE + sections * DESCRIPTOR_SIZE;
    let crc = crc32fast::hash(&bytes[..crc_pos]);
    bytes[crc_pos..crc_pos + 4].copy_from_slice(&crc.to_le_bytes());
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn test_loads_both_format_versions() {
    for version in [FormatVersion::V31, FormatVersion::V32] {
        let store = common::sample_store(version);
        assert_eq!(store.format_version(), version);
        assert_eq!(store.published(), 1_700_000_000);
        assert_eq!(store.strings().count(), 8);
        assert_eq!(store.components().count(), 2);
        assert_eq!(store.signatures().count(), 2);
        assert_eq!(store.nodes().count(), 2);
    }
}

#[test]
fn test_v32_only_sections() {
    let v31 = common::sample_store(FormatVersion::V31);
    assert!(v31.signature_node_offsets().is_none());
    assert!(v31.node_ranked_signature_indexes().is_none());

    let v32 = common::sample_store(FormatVersion::V32);
    let offsets = v32.signature_node_offsets().unwrap();
    assert_eq!(offsets.count(), 3);
    let indexes = v32.node_ranked_signature_indexes().unwrap();
    assert_eq!(indexes.count(), 2);
}

#[test]
fn test_open_from_file_captures_last_modified() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("sample.dat");
    let sample = common::sample_file(FormatVersion::V32);
    std::fs::write(&path, &sample.bytes).unwrap();

    let store = Store::open(&path).unwrap();
    assert!(store.last_modified().is_some());
    assert!(!store.is_temporary());
    assert_eq!(store.source_len(), sample.bytes.len() as u64);

    // Queries work the same through a file-backed source
    let profile = store.profiles().get(sample.profile_offsets[0]).unwrap();
    assert_eq!(profile.profile_id, 1001);

    drop(store);
    assert!(path.exists());
}

#[test]
fn test_in_memory_store_has_no_file_metadata() {
    let store = common::sample_store(FormatVersion::V31);
    assert!(store.last_modified().is_none());
    assert!(!store.is_temporary());
}

#[test]
fn test_temporary_file_deleted_on_drop() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("download.dat");
    std::fs::write(&path, common::sample_file(FormatVersion::V31).bytes).unwrap();

    let store = Store::open_temporary(&path).unwrap();
    assert!(store.is_temporary());
    assert!(path.exists());

    drop(store);
    assert!(!path.exists());
}

#[test]
fn test_stores_get_distinct_ids() {
    let a = common::sample_store(FormatVersion::V31);
    let b = common::sample_store(FormatVersion::V31);
    assert_ne!(a.store_id(), b.store_id());
}

// =============================================================================
// Version-Matched Decoding
// =============================================================================

#[test]
fn test_versions_decode_field_identical_entities() {
    let v31 = common::sample_store(FormatVersion::V31);
    let v32 = common::sample_store(FormatVersion::V32);

    // Version-independent sections decode identically
    for i in 0..v31.values().count() {
        let a = v31.values().get(i).unwrap();
        let b = v32.values().get(i).unwrap();
        assert_eq!(a.property_index, b.property_index);
        assert_eq!(a.name_offset, b.name_offset);
    }
    for i in 0..v31.properties().count() {
        let a = v31.properties().get(i).unwrap();
        let b = v32.properties().get(i).unwrap();
        assert_eq!(a.component_index, b.component_index);
        assert_eq!(a.first_value_index, b.first_value_index);
        assert_eq!(a.last_value_index, b.last_value_index);
    }

    // Signature layouts differ per version, but the logical content the
    // version-matched factories decode must agree
    for i in 0..v31.signatures().count() {
        let a = v31.signatures().get(i).unwrap();
        let b = v32.signatures().get(i).unwrap();
        assert_eq!(a.profile_indexes, b.profile_indexes);
        assert_eq!(a.node_count(), b.node_count());
        assert!(matches!(&a.nodes, SignatureNodes::Inline(_)));
        assert!(matches!(&b.nodes, SignatureNodes::Indexed { .. }));
    }
}

#[test]
fn test_node_layouts_decode_per_version() {
    let v31_sample = common::sample_file(FormatVersion::V31);
    let v32_sample = common::sample_file(FormatVersion::V32);
    let v31 = Store::from_bytes(v31_sample.bytes).unwrap();
    let v32 = Store::from_bytes(v32_sample.bytes).unwrap();

    for (&a_off, &b_off) in v31_sample.node_offsets.iter().zip(&v32_sample.node_offsets) {
        let a = v31.nodes().get(a_off).unwrap();
        let b = v32.nodes().get(b_off).unwrap();

        assert!(a.is_root());
        assert_eq!(a.parent_offset, b.parent_offset);
        assert_eq!(a.root_offset, b.root_offset);
        assert_eq!(a.character_position, b.character_position);
        assert_eq!(a.children.len(), b.children.len());
        assert_eq!(a.signature_count(), b.signature_count());
        assert!(matches!(&a.signatures, NodeSignatures::Inline(_)));
        assert!(matches!(&b.signatures, NodeSignatures::Indexed { .. }));
    }
}

// =============================================================================
// Structural Failures
// =============================================================================

#[test]
fn test_empty_source_is_rejected() {
    let result = Store::from_bytes(Vec::new());
    assert!(matches!(result, Err(StoreError::MalformedHeader(_))));
}

#[test]
fn test_truncated_header_is_rejected() {
    let mut bytes = common::sample_file(FormatVersion::V31).bytes;
    bytes.truncate(10);
    let result = Store::from_bytes(bytes);
    assert!(matches!(result, Err(StoreError::MalformedHeader(_))));
}

#[test]
fn test_bad_magic_is_rejected() {
    let mut bytes = common::sample_file(FormatVersion::V31).bytes;
    bytes[0..4].copy_from_slice(b"NOPE");
    let result = Store::from_bytes(bytes);
    assert!(matches!(result, Err(StoreError::MalformedHeader(_))));
}

#[test]
fn test_unrecognized_version_marker_is_rejected() {
    let mut bytes = common::sample_file(FormatVersion::V31).bytes;
    bytes[VERSION_MARKER_POS..VERSION_MARKER_POS + 2].copy_from_slice(&33u16.to_le_bytes());
    let result = Store::from_bytes(bytes);
    assert!(matches!(result, Err(StoreError::UnsupportedVersion(33))));
}

#[test]
fn test_header_crc_mismatch_is_rejected() {
    let mut bytes = common::sample_file(FormatVersion::V31).bytes;
    // Corrupt the published timestamp without fixing the CRC
    bytes[6] ^= 0xFF;
    let result = Store::from_bytes(bytes);
    assert!(matches!(result, Err(StoreError::MalformedHeader(_))));
}

#[test]
fn test_descriptor_past_source_end_is_rejected() {
    let mut bytes = common::sample_file(FormatVersion::V31).bytes;

    // Inflate the value-section count (descriptor 4) past the source end
    let count_pos = PRELUDE_SIZE + 4 * DESCRIPTOR_SIZE + 8;
    bytes[count_pos..count_pos + 4].copy_from_slice(&u32::MAX.to_le_bytes());
    rewrite_header_crc(&mut bytes, FormatVersion::V31);

    let result = Store::from_bytes(bytes);
    assert!(matches!(result, Err(StoreError::MalformedHeader(_))));
}

#[test]
fn test_section_inside_header_is_rejected() {
    let mut bytes = common::sample_file(FormatVersion::V31).bytes;

    // Point the string section at position 0, inside the header
    let start_pos = PRELUDE_SIZE;
    bytes[start_pos..start_pos + 8].copy_from_slice(&0u64.to_le_bytes());
    rewrite_header_crc(&mut bytes, FormatVersion::V31);

    let result = Store::from_bytes(bytes);
    assert!(matches!(result, Err(StoreError::MalformedHeader(_))));
}

// =============================================================================
// Query-Time Failure Isolation
// =============================================================================

#[test]
fn test_query_failures_leave_the_store_usable() {
    let store = common::sample_store(FormatVersion::V32);

    assert!(store.values().get(999).is_err());
    assert!(store.profiles().get(u32::MAX - 1).is_err());

    // Concurrent and subsequent queries are unaffected
    assert_eq!(store.values().get(0).unwrap().property_index, 0);
    assert_eq!(store.signatures().get(0).unwrap().node_count(), 2);
    assert_eq!(store.idle_readers(), store.readers_created());
}
