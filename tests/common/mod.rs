//! Shared fixture construction for integration tests.
//!
//! `sample_file` builds a small, fully cross-linked data file with the same
//! logical content for both format versions: two components, two
//! properties, four values, four profiles, two nodes, and two signatures.

#![allow(dead_code)]

use devicedb::fixture::DataFileBuilder;
use devicedb::{Config, FormatVersion, Store};

/// Unused-slot sentinel as written to disk
pub const NONE: u32 = u32::MAX;

/// Keys captured while building the sample file
pub struct SampleFile {
    pub bytes: Vec<u8>,
    /// Byte offsets of the added strings, in add order
    pub string_offsets: Vec<u32>,
    /// Byte offsets of the added profiles, in add order
    pub profile_offsets: Vec<u32>,
    /// Byte offsets of the added nodes, in add order
    pub node_offsets: Vec<u32>,
}

/// Build the canonical sample file for `version`
pub fn sample_file(version: FormatVersion) -> SampleFile {
    let mut builder = DataFileBuilder::new(version, 2, 2).published(1_700_000_000);

    // Strings: component/property/value names
    let s_hardware = builder.add_string("Hardware");
    let s_software = builder.add_string("Software");
    let s_model = builder.add_string("Model");
    let s_browser = builder.add_string("Browser");
    let s_phone = builder.add_string("Phone");
    let s_tablet = builder.add_string("Tablet");
    let s_chrome = builder.add_string("Chrome/120");
    let s_safari = builder.add_string("Safari/17");
    let string_offsets = vec![
        s_hardware, s_software, s_model, s_browser, s_phone, s_tablet, s_chrome, s_safari,
    ];

    // Components and maps
    builder.add_component(1, s_hardware, 0);
    builder.add_component(2, s_software, 2);
    builder.add_map(s_hardware);
    builder.add_map(s_software);

    // Properties: Model on component 0 (values 0..=1), Browser on
    // component 1 (values 2..=3)
    builder.add_property(0, 0, s_model, 0, 0, 1);
    builder.add_property(1, 0, s_browser, 2, 2, 3);

    // Values
    builder.add_value(0, s_phone, NONE, NONE);
    builder.add_value(0, s_tablet, NONE, NONE);
    builder.add_value(1, s_chrome, NONE, NONE);
    builder.add_value(1, s_safari, NONE, NONE);

    // Profiles
    let p0 = builder.add_profile(0, 1001, &[0, 2]);
    let p1 = builder.add_profile(0, 1002, &[1]);
    let p2 = builder.add_profile(1, 2001, &[2]);
    let p3 = builder.add_profile(1, 2002, &[3]);
    let profile_offsets = vec![p0, p1, p2, p3];
    builder.add_profile_offset(1001, p0);
    builder.add_profile_offset(1002, p1);
    builder.add_profile_offset(2001, p2);
    builder.add_profile_offset(2002, p3);

    // Nodes: n0 is a root with no children, n1 matches "Phone" toward n0
    let node_offsets = match version {
        FormatVersion::V31 => {
            let n0 = builder
                .add_node_v31(-1, 0, 0, &[], &[0])
                .expect("v31 node");
            let n1 = builder
                .add_node_v31(-1, 0, 3, &[(s_phone, n0 as i32)], &[1])
                .expect("v31 node");
            vec![n0, n1]
        }
        FormatVersion::V32 => {
            let n0 = builder
                .add_node_v32(-1, 0, 0, &[], 1, 0)
                .expect("v32 node");
            let n1 = builder
                .add_node_v32(-1, 0, 3, &[(s_phone, n0 as i32)], 1, 1)
                .expect("v32 node");
            builder
                .add_node_ranked_signature_index(0)
                .expect("v32 index");
            builder
                .add_node_ranked_signature_index(1)
                .expect("v32 index");
            vec![n0, n1]
        }
    };

    // Signatures: sig0 over both nodes, sig1 over n1 only
    match version {
        FormatVersion::V31 => {
            builder
                .add_signature_v31(&[0, 2], &[node_offsets[0], node_offsets[1]])
                .expect("v31 signature");
            builder
                .add_signature_v31(&[1, 3], &[node_offsets[1]])
                .expect("v31 signature");
        }
        FormatVersion::V32 => {
            builder
                .add_signature_v32(&[0, 2], 2, 0, 0, 0)
                .expect("v32 signature");
            builder
                .add_signature_v32(&[1, 3], 1, 2, 1, 0)
                .expect("v32 signature");
            builder
                .add_signature_node_offset(node_offsets[0])
                .expect("v32 offset");
            builder
                .add_signature_node_offset(node_offsets[1])
                .expect("v32 offset");
            builder
                .add_signature_node_offset(node_offsets[1])
                .expect("v32 offset");
        }
    }

    builder.add_ranked_signature_index(0);
    builder.add_ranked_signature_index(1);
    builder.add_root_node(node_offsets[0]);
    builder.add_root_node(node_offsets[1]);

    SampleFile {
        bytes: builder.to_bytes(),
        string_offsets,
        profile_offsets,
        node_offsets,
    }
}

/// Load the canonical sample file with default cache sizing
pub fn sample_store(version: FormatVersion) -> Store {
    Store::from_bytes(sample_file(version).bytes).expect("sample store loads")
}

/// Load the canonical sample file with small caches for eviction tests
pub fn sample_store_with_caches(version: FormatVersion, capacity: usize) -> Store {
    let config = Config::builder()
        .string_cache_size(capacity)
        .value_cache_size(capacity)
        .profile_cache_size(capacity)
        .signature_cache_size(capacity)
        .node_cache_size(capacity)
        .index_cache_size(capacity)
        .build();
    Store::from_bytes_with_config(sample_file(version).bytes, config).expect("sample store loads")
}
