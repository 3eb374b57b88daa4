//! Global Header
//!
//! Versioned descriptor of the whole container.
//!
//! ## Layout
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Prelude (16 bytes)                                           │
//! │   Magic: "DVDB" (4) | Version: u16 (2) | Published: i64 (8)  │
//! │   ProfilesPerSignature: u8 (1) | NodesPerSignature: u8 (1)   │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Section Descriptor Table (12 bytes each, dependency order)   │
//! │   [Start: u64][Count: u32]                                   │
//! │   11 descriptors for V31, 13 for V32                         │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Header CRC32 (4 bytes, over prelude + table)                 │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//! Sections follow the header contiguously, in descriptor order. All
//! integers little-endian.

use std::io;

use crate::error::{Result, StoreError};
use crate::list::SectionHeader;
use crate::reader::Reader;

/// A header cut short is a structural defect of the source, not a
/// transient read failure
fn truncated(err: StoreError) -> StoreError {
    match err {
        StoreError::Io(ref io_err) if io_err.kind() == io::ErrorKind::UnexpectedEof => {
            StoreError::malformed("truncated header")
        }
        other => other,
    }
}

/// Magic bytes identifying a devicedb data file
pub(crate) const MAGIC: &[u8; 4] = b"DVDB";

/// Prelude size: magic (4) + version (2) + published (8) + two per-file
/// signature constants (2)
pub(crate) const PRELUDE_SIZE: usize = 16;

/// On-disk size of one section descriptor
pub(crate) const DESCRIPTOR_SIZE: usize = 12;

// =============================================================================
// Format Version
// =============================================================================

/// Supported binary format variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatVersion {
    /// Older layout: signatures carry node offsets inline, nodes carry
    /// ranked-signature indexes inline
    V31,
    /// Newer layout: adds the signature-node-offsets and
    /// node-ranked-signature-indexes sections
    V32,
}

impl FormatVersion {
    /// Parse the on-disk version marker
    pub fn from_marker(marker: u16) -> Result<Self> {
        match marker {
            31 => Ok(FormatVersion::V31),
            32 => Ok(FormatVersion::V32),
            other => Err(StoreError::UnsupportedVersion(other)),
        }
    }

    /// The on-disk version marker
    pub fn marker(self) -> u16 {
        match self {
            FormatVersion::V31 => 31,
            FormatVersion::V32 => 32,
        }
    }

    /// Number of section descriptors in this version's header
    pub(crate) fn section_count(self) -> usize {
        match self {
            FormatVersion::V31 => 11,
            FormatVersion::V32 => 13,
        }
    }

    /// Total header size including the trailing CRC
    pub(crate) fn header_size(self) -> u64 {
        (PRELUDE_SIZE + self.section_count() * DESCRIPTOR_SIZE + 4) as u64
    }
}

// =============================================================================
// Data Header
// =============================================================================

/// Parsed global header: format metadata plus every section descriptor in
/// dependency order
#[derive(Debug, Clone)]
pub struct DataHeader {
    pub version: FormatVersion,
    /// Publication time of the data, unix seconds
    pub published: i64,
    /// Fixed profile-slot width of every signature record
    pub profiles_per_signature: u8,
    /// Fixed node-slot width of every V31 signature record
    pub nodes_per_signature: u8,

    pub strings: SectionHeader,
    pub components: SectionHeader,
    pub maps: SectionHeader,
    pub properties: SectionHeader,
    pub values: SectionHeader,
    pub profiles: SectionHeader,
    pub signatures: SectionHeader,
    /// V32 only
    pub signature_node_offsets: Option<SectionHeader>,
    /// V32 only
    pub node_ranked_signature_indexes: Option<SectionHeader>,
    pub ranked_signature_indexes: SectionHeader,
    pub nodes: SectionHeader,
    pub root_nodes: SectionHeader,
    pub profile_offsets: SectionHeader,
}

impl DataHeader {
    /// Read and validate the global header from position 0.
    ///
    /// Fails with `MalformedHeader` on bad magic or CRC mismatch and
    /// `UnsupportedVersion` on an unrecognized marker. The CRC covers the
    /// prelude and the descriptor table.
    pub fn read_from(reader: &mut Reader) -> Result<Self> {
        reader.seek(0)?;
        let prelude = reader.read_bytes(PRELUDE_SIZE).map_err(truncated)?;

        if &prelude[0..4] != MAGIC {
            return Err(StoreError::malformed(format!(
                "bad magic: expected {:?}, got {:?}",
                MAGIC,
                &prelude[0..4]
            )));
        }

        let marker = u16::from_le_bytes([prelude[4], prelude[5]]);
        let version = FormatVersion::from_marker(marker)?;

        let mut published = [0u8; 8];
        published.copy_from_slice(&prelude[6..14]);
        let published = i64::from_le_bytes(published);
        let profiles_per_signature = prelude[14];
        let nodes_per_signature = prelude[15];

        let table = reader
            .read_bytes(version.section_count() * DESCRIPTOR_SIZE)
            .map_err(truncated)?;
        let stored_crc = reader.read_u32().map_err(truncated)?;

        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&prelude);
        hasher.update(&table);
        let computed_crc = hasher.finalize();
        if stored_crc != computed_crc {
            return Err(StoreError::malformed(format!(
                "header CRC mismatch: stored {:#010x}, computed {:#010x}",
                stored_crc, computed_crc
            )));
        }

        let mut descriptors = table
            .chunks_exact(DESCRIPTOR_SIZE)
            .map(SectionHeader::parse);
        // Table length is section_count * DESCRIPTOR_SIZE, so next() cannot
        // run dry here
        let mut next = || descriptors.next().expect("descriptor table exhausted");

        let strings = next();
        let components = next();
        let maps = next();
        let properties = next();
        let values = next();
        let profiles = next();
        let signatures = next();
        let (signature_node_offsets, node_ranked_signature_indexes) = match version {
            FormatVersion::V31 => (None, None),
            FormatVersion::V32 => (Some(next()), Some(next())),
        };
        let ranked_signature_indexes = next();
        let nodes = next();
        let root_nodes = next();
        let profile_offsets = next();

        Ok(Self {
            version,
            published,
            profiles_per_signature,
            nodes_per_signature,
            strings,
            components,
            maps,
            properties,
            values,
            profiles,
            signatures,
            signature_node_offsets,
            node_ranked_signature_indexes,
            ranked_signature_indexes,
            nodes,
            root_nodes,
            profile_offsets,
        })
    }
}
