//! Synthetic data-file construction.
//!
//! Test and benchmark tooling only: the store itself has no write path.
//! The builder accumulates records per section, then assembles the
//! versioned container — prelude, descriptor table, header CRC, and the
//! sections laid out contiguously in dependency order.
//!
//! `add_*` methods return the key the written record will have at query
//! time: the ordinal for fixed-width sections, the byte offset for
//! variable-width sections. Records must therefore be added before anything
//! that references them, mirroring the format's no-forward-references rule.

use std::fs;
use std::path::Path;

use crate::entity::NO_INDEX;
use crate::error::{Result, StoreError};
use crate::store::FormatVersion;

/// Builder for synthetic data files
pub struct DataFileBuilder {
    version: FormatVersion,
    published: i64,
    profiles_per_signature: u8,
    nodes_per_signature: u8,

    strings: Section,
    components: Section,
    maps: Section,
    properties: Section,
    values: Section,
    profiles: Section,
    signatures: Section,
    signature_node_offsets: Section,
    node_ranked_signature_indexes: Section,
    ranked_signature_indexes: Section,
    nodes: Section,
    root_nodes: Section,
    profile_offsets: Section,
}

/// One section being accumulated: serialized bytes plus record count
#[derive(Default)]
struct Section {
    bytes: Vec<u8>,
    count: u32,
}

impl Section {
    fn offset(&self) -> u32 {
        self.bytes.len() as u32
    }

    fn push_record(&mut self, bytes: &[u8]) -> u32 {
        let key = self.count;
        self.bytes.extend_from_slice(bytes);
        self.count += 1;
        key
    }

    fn push_variable_record(&mut self, bytes: &[u8]) -> u32 {
        let offset = self.offset();
        self.bytes.extend_from_slice(bytes);
        self.count += 1;
        offset
    }
}

impl DataFileBuilder {
    /// Start a builder for the given format version.
    ///
    /// `profiles_per_signature` and `nodes_per_signature` fix the signature
    /// record width for the whole file (V32 ignores the node constant).
    pub fn new(version: FormatVersion, profiles_per_signature: u8, nodes_per_signature: u8) -> Self {
        Self {
            version,
            published: 0,
            profiles_per_signature,
            nodes_per_signature,
            strings: Section::default(),
            components: Section::default(),
            maps: Section::default(),
            properties: Section::default(),
            values: Section::default(),
            profiles: Section::default(),
            signatures: Section::default(),
            signature_node_offsets: Section::default(),
            node_ranked_signature_indexes: Section::default(),
            ranked_signature_indexes: Section::default(),
            nodes: Section::default(),
            root_nodes: Section::default(),
            profile_offsets: Section::default(),
        }
    }

    /// Set the publication timestamp (unix seconds)
    pub fn published(mut self, unix_secs: i64) -> Self {
        self.published = unix_secs;
        self
    }

    // =========================================================================
    // Variable-Width Records (return byte offsets)
    // =========================================================================

    /// Append a string; returns its byte offset within the string section
    pub fn add_string(&mut self, text: &str) -> u32 {
        let mut record = Vec::with_capacity(2 + text.len());
        record.extend_from_slice(&(text.len() as u16).to_le_bytes());
        record.extend_from_slice(text.as_bytes());
        self.strings.push_variable_record(&record)
    }

    /// Append a profile; returns its byte offset within the profile section
    pub fn add_profile(
        &mut self,
        component_index: u8,
        profile_id: u32,
        value_indexes: &[u32],
    ) -> u32 {
        let mut record = Vec::with_capacity(9 + value_indexes.len() * 4);
        record.push(component_index);
        record.extend_from_slice(&profile_id.to_le_bytes());
        record.extend_from_slice(&(value_indexes.len() as u32).to_le_bytes());
        for &index in value_indexes {
            record.extend_from_slice(&index.to_le_bytes());
        }
        self.profiles.push_variable_record(&record)
    }

    /// Append a V31 node; returns its byte offset within the node section
    pub fn add_node_v31(
        &mut self,
        parent_offset: i32,
        root_offset: i32,
        character_position: i16,
        children: &[(u32, i32)],
        ranked_signature_indexes: &[u32],
    ) -> Result<u32> {
        self.require_version(FormatVersion::V31, "add_node_v31")?;
        let mut record = node_prelude(parent_offset, root_offset, character_position, children)?;
        record.extend_from_slice(&(ranked_signature_indexes.len() as u16).to_le_bytes());
        push_children(&mut record, children);
        for &index in ranked_signature_indexes {
            record.extend_from_slice(&index.to_le_bytes());
        }
        Ok(self.nodes.push_variable_record(&record))
    }

    /// Append a V32 node; returns its byte offset within the node section
    pub fn add_node_v32(
        &mut self,
        parent_offset: i32,
        root_offset: i32,
        character_position: i16,
        children: &[(u32, i32)],
        ranked_signature_count: u16,
        first_ranked_signature_index: u32,
    ) -> Result<u32> {
        self.require_version(FormatVersion::V32, "add_node_v32")?;
        let mut record = node_prelude(parent_offset, root_offset, character_position, children)?;
        record.extend_from_slice(&ranked_signature_count.to_le_bytes());
        record.extend_from_slice(&first_ranked_signature_index.to_le_bytes());
        push_children(&mut record, children);
        Ok(self.nodes.push_variable_record(&record))
    }

    // =========================================================================
    // Fixed-Width Records (return ordinals)
    // =========================================================================

    /// Append a component; returns its ordinal
    pub fn add_component(
        &mut self,
        component_id: u8,
        name_offset: u32,
        default_profile_offset: u32,
    ) -> u32 {
        let mut record = Vec::with_capacity(9);
        record.push(component_id);
        record.extend_from_slice(&name_offset.to_le_bytes());
        record.extend_from_slice(&default_profile_offset.to_le_bytes());
        self.components.push_record(&record)
    }

    /// Append a map; returns its ordinal
    pub fn add_map(&mut self, name_offset: u32) -> u32 {
        self.maps.push_record(&name_offset.to_le_bytes())
    }

    /// Append a property; returns its ordinal
    #[allow(clippy::too_many_arguments)]
    pub fn add_property(
        &mut self,
        component_index: u8,
        value_type: u8,
        name_offset: u32,
        default_value_index: u32,
        first_value_index: u32,
        last_value_index: u32,
    ) -> u32 {
        let mut record = Vec::with_capacity(18);
        record.push(component_index);
        record.push(value_type);
        record.extend_from_slice(&name_offset.to_le_bytes());
        record.extend_from_slice(&default_value_index.to_le_bytes());
        record.extend_from_slice(&first_value_index.to_le_bytes());
        record.extend_from_slice(&last_value_index.to_le_bytes());
        self.properties.push_record(&record)
    }

    /// Append a value; returns its ordinal
    pub fn add_value(
        &mut self,
        property_index: u16,
        name_offset: u32,
        description_offset: u32,
        url_offset: u32,
    ) -> u32 {
        let mut record = Vec::with_capacity(14);
        record.extend_from_slice(&property_index.to_le_bytes());
        record.extend_from_slice(&name_offset.to_le_bytes());
        record.extend_from_slice(&description_offset.to_le_bytes());
        record.extend_from_slice(&url_offset.to_le_bytes());
        self.values.push_record(&record)
    }

    /// Append a V31 signature; lists are padded to the per-file constants
    /// with unused-slot sentinels. Returns the signature's ordinal.
    pub fn add_signature_v31(&mut self, profiles: &[u32], node_offsets: &[u32]) -> Result<u32> {
        self.require_version(FormatVersion::V31, "add_signature_v31")?;
        let mut record =
            padded_indexes(profiles, self.profiles_per_signature, "signature profiles")?;
        record.extend(padded_indexes(
            node_offsets,
            self.nodes_per_signature,
            "signature nodes",
        )?);
        Ok(self.signatures.push_record(&record))
    }

    /// Append a V32 signature; returns its ordinal
    pub fn add_signature_v32(
        &mut self,
        profiles: &[u32],
        node_count: u8,
        first_node_offset_index: u32,
        rank: u32,
        flags: u8,
    ) -> Result<u32> {
        self.require_version(FormatVersion::V32, "add_signature_v32")?;
        let mut record =
            padded_indexes(profiles, self.profiles_per_signature, "signature profiles")?;
        record.push(node_count);
        record.extend_from_slice(&first_node_offset_index.to_le_bytes());
        record.extend_from_slice(&rank.to_le_bytes());
        record.push(flags);
        Ok(self.signatures.push_record(&record))
    }

    /// Append a signature node offset (V32 only); returns its ordinal
    pub fn add_signature_node_offset(&mut self, node_offset: u32) -> Result<u32> {
        self.require_version(FormatVersion::V32, "add_signature_node_offset")?;
        Ok(self
            .signature_node_offsets
            .push_record(&node_offset.to_le_bytes()))
    }

    /// Append a node ranked-signature index (V32 only); returns its ordinal
    pub fn add_node_ranked_signature_index(&mut self, signature_index: u32) -> Result<u32> {
        self.require_version(FormatVersion::V32, "add_node_ranked_signature_index")?;
        Ok(self
            .node_ranked_signature_indexes
            .push_record(&signature_index.to_le_bytes()))
    }

    /// Append a ranked signature index; returns its ordinal
    pub fn add_ranked_signature_index(&mut self, signature_index: u32) -> u32 {
        self.ranked_signature_indexes
            .push_record(&signature_index.to_le_bytes())
    }

    /// Append a root-node offset; returns its ordinal
    pub fn add_root_node(&mut self, node_offset: u32) -> u32 {
        self.root_nodes.push_record(&node_offset.to_le_bytes())
    }

    /// Append a profile-offset record; returns its ordinal
    pub fn add_profile_offset(&mut self, profile_id: u32, offset: u32) -> u32 {
        let mut record = Vec::with_capacity(8);
        record.extend_from_slice(&profile_id.to_le_bytes());
        record.extend_from_slice(&offset.to_le_bytes());
        self.profile_offsets.push_record(&record)
    }

    // =========================================================================
    // Assembly
    // =========================================================================

    /// Serialize the complete container
    pub fn to_bytes(&self) -> Vec<u8> {
        let sections = self.ordered_sections();

        // Prelude
        let mut header = Vec::new();
        header.extend_from_slice(crate::store::header::MAGIC);
        header.extend_from_slice(&self.version.marker().to_le_bytes());
        header.extend_from_slice(&self.published.to_le_bytes());
        header.push(self.profiles_per_signature);
        header.push(self.nodes_per_signature);

        // Descriptor table: sections laid out contiguously after the header
        let mut position = self.version.header_size();
        for section in &sections {
            header.extend_from_slice(&position.to_le_bytes());
            header.extend_from_slice(&section.count.to_le_bytes());
            position += section.bytes.len() as u64;
        }

        let crc = crc32fast::hash(&header);
        header.extend_from_slice(&crc.to_le_bytes());

        let mut file = header;
        for section in &sections {
            file.extend_from_slice(&section.bytes);
        }
        file
    }

    /// Serialize the container to a file
    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_bytes())?;
        Ok(())
    }

    fn ordered_sections(&self) -> Vec<&Section> {
        let mut sections = vec![
            &self.strings,
            &self.components,
            &self.maps,
            &self.properties,
            &self.values,
            &self.profiles,
            &self.signatures,
        ];
        if self.version == FormatVersion::V32 {
            sections.push(&self.signature_node_offsets);
            sections.push(&self.node_ranked_signature_indexes);
        }
        sections.push(&self.ranked_signature_indexes);
        sections.push(&self.nodes);
        sections.push(&self.root_nodes);
        sections.push(&self.profile_offsets);
        sections
    }

    fn require_version(&self, required: FormatVersion, method: &str) -> Result<()> {
        if self.version == required {
            Ok(())
        } else {
            Err(StoreError::malformed(format!(
                "{} is only valid for format version {}",
                method,
                required.marker()
            )))
        }
    }
}

/// Shared node prefix: parent, root, character position, child count
fn node_prelude(
    parent_offset: i32,
    root_offset: i32,
    character_position: i16,
    children: &[(u32, i32)],
) -> Result<Vec<u8>> {
    let children_count = u16::try_from(children.len())
        .map_err(|_| StoreError::malformed("node has more than u16::MAX children"))?;
    let mut record = Vec::with_capacity(12 + children.len() * 8);
    record.extend_from_slice(&parent_offset.to_le_bytes());
    record.extend_from_slice(&root_offset.to_le_bytes());
    record.extend_from_slice(&character_position.to_le_bytes());
    record.extend_from_slice(&children_count.to_le_bytes());
    Ok(record)
}

fn push_children(record: &mut Vec<u8>, children: &[(u32, i32)]) {
    for &(character_offset, node_offset) in children {
        record.extend_from_slice(&character_offset.to_le_bytes());
        record.extend_from_slice(&node_offset.to_le_bytes());
    }
}

/// Pad an index list to `width` slots with the unused-slot sentinel
fn padded_indexes(indexes: &[u32], width: u8, what: &str) -> Result<Vec<u8>> {
    if indexes.len() > usize::from(width) {
        return Err(StoreError::malformed(format!(
            "{} list of {} exceeds the per-file width {}",
            what,
            indexes.len(),
            width
        )));
    }
    let mut bytes = Vec::with_capacity(usize::from(width) * 4);
    for &index in indexes {
        bytes.extend_from_slice(&index.to_le_bytes());
    }
    for _ in indexes.len()..usize::from(width) {
        bytes.extend_from_slice(&NO_INDEX.to_le_bytes());
    }
    Ok(bytes)
}
