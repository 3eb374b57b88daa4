//! Section Header
//!
//! Descriptor of one contiguous region of the byte source.

use crate::error::{Result, StoreError};

/// Describes where a section starts and how many records it holds.
///
/// For fixed-width sections the record byte length comes from the factory,
/// not the descriptor; for variable-width sections `count` is the number of
/// records and the region's byte length is derived from the next section's
/// start position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionHeader {
    /// Absolute byte position where the section begins
    pub start_position: u64,
    /// Number of records in the section
    pub count: u32,
}

impl SectionHeader {
    /// Parse one descriptor from a raw header slice
    pub(crate) fn parse(bytes: &[u8]) -> Self {
        let mut start = [0u8; 8];
        start.copy_from_slice(&bytes[0..8]);
        let mut count = [0u8; 4];
        count.copy_from_slice(&bytes[8..12]);
        Self {
            start_position: u64::from_le_bytes(start),
            count: u32::from_le_bytes(count),
        }
    }

    /// Check a fixed-width section fits inside the source
    pub fn validate_fixed(&self, entry_length: u32, source_len: u64, name: &str) -> Result<()> {
        let bytes = u64::from(self.count) * u64::from(entry_length);
        let end = self.start_position.checked_add(bytes);
        match end {
            Some(end) if self.start_position <= source_len && end <= source_len => Ok(()),
            _ => Err(StoreError::malformed(format!(
                "section '{}' ({} entries of {} bytes at {}) exceeds source length {}",
                name, self.count, entry_length, self.start_position, source_len
            ))),
        }
    }

    /// Check a variable-width region `[start_position, region_end)` is
    /// well-formed and inside the source
    pub fn validate_region(&self, region_end: u64, source_len: u64, name: &str) -> Result<()> {
        if self.start_position <= region_end && region_end <= source_len {
            Ok(())
        } else {
            Err(StoreError::malformed(format!(
                "section '{}' region [{}, {}) inconsistent with source length {}",
                name, self.start_position, region_end, source_len
            )))
        }
    }
}
