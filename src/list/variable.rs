//! Variable-Width Section List
//!
//! Records of differing byte length, addressed by their byte offset within
//! the section. Offsets come from other sections (profile offsets, node
//! offsets, the record's own neighbors during a scan), never from ordinal
//! arithmetic — there is no per-record length table beyond each record
//! describing itself.

use std::sync::Arc;

use crate::entity::{Entity, EntityFactory, StoreId};
use crate::error::{Result, StoreError};
use crate::list::{EntityRange, SectionHeader, SectionList};
use crate::reader::{PooledReader, ReaderPool};

/// Section list over records addressed by byte offset
pub struct VariableList<T: Entity> {
    store: StoreId,
    header: SectionHeader,
    /// Byte length of the region; `get` bounds offsets against this
    region_len: u32,
    factory: Arc<dyn EntityFactory<T>>,
    pool: Arc<ReaderPool>,
}

impl<T: Entity> VariableList<T> {
    /// Build a list over the region `[header.start_position, region_end)`.
    ///
    /// The loader derives `region_end` from the next section's start; the
    /// container lays sections out contiguously in dependency order.
    pub fn new(
        store: StoreId,
        header: SectionHeader,
        region_end: u64,
        factory: Arc<dyn EntityFactory<T>>,
        pool: Arc<ReaderPool>,
        name: &str,
    ) -> Result<Self> {
        if factory.entry_length().is_some() {
            return Err(StoreError::malformed(format!(
                "section '{}' requires a variable-width factory",
                name
            )));
        }
        header.validate_region(region_end, pool.source().len(), name)?;

        let region_len = region_end - header.start_position;
        let region_len = u32::try_from(region_len).map_err(|_| {
            StoreError::malformed(format!(
                "section '{}' region of {} bytes exceeds the offset space",
                name, region_len
            ))
        })?;

        Ok(Self {
            store,
            header,
            region_len,
            factory,
            pool,
        })
    }

    /// The section descriptor this list was built from
    pub fn header(&self) -> &SectionHeader {
        &self.header
    }

    /// Byte length of the section
    pub fn region_len(&self) -> u32 {
        self.region_len
    }
}

impl<T: Entity> SectionList<T> for VariableList<T> {
    fn count(&self) -> u32 {
        self.header.count
    }

    /// `index` is the record's byte offset within the section; the bound is
    /// the region byte length, not the record count
    fn get(&self, index: u32) -> Result<Arc<T>> {
        if index >= self.region_len {
            return Err(StoreError::OutOfRange {
                index,
                count: self.region_len,
            });
        }

        let mut reader = self.pool.acquire()?;
        reader.seek(self.header.start_position + u64::from(index))?;
        Ok(Arc::new(self.factory.create(self.store, index, &mut reader)?))
    }

    /// `index` is the byte offset of the first record; `count` is the
    /// number of consecutive records to decode from there
    fn range(&self, index: u32, count: u32) -> Result<EntityRange<'_, T>> {
        if index > self.region_len {
            return Err(StoreError::OutOfRange {
                index,
                count: self.region_len,
            });
        }

        let mut reader = self.pool.acquire()?;
        reader.seek(self.header.start_position + u64::from(index))?;

        Ok(Box::new(VariableRange {
            store: self.store,
            factory: Arc::clone(&self.factory),
            reader: Some(reader),
            section_start: self.header.start_position,
            section_end: self.header.start_position + u64::from(self.region_len),
            region_len: self.region_len,
            remaining: count,
        }))
    }
}

/// Streaming traversal over a variable-width section.
///
/// Each record's index is the reader position at the moment decoding
/// starts, relative to the section start. The pooled reader is released on
/// exhaustion or error; early drop releases through the guard.
struct VariableRange<T: Entity> {
    store: StoreId,
    factory: Arc<dyn EntityFactory<T>>,
    reader: Option<PooledReader>,
    section_start: u64,
    section_end: u64,
    region_len: u32,
    remaining: u32,
}

impl<T: Entity> Iterator for VariableRange<T> {
    type Item = Result<Arc<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            self.reader = None;
            return None;
        }
        let reader = self.reader.as_mut()?;
        self.remaining -= 1;

        // Running past the region means the caller asked for more records
        // than the section holds from this offset
        if reader.position() >= self.section_end {
            let err = StoreError::OutOfRange {
                index: (self.section_end - self.section_start) as u32,
                count: self.region_len,
            };
            self.reader = None;
            self.remaining = 0;
            return Some(Err(err));
        }

        let index = (reader.position() - self.section_start) as u32;
        match self.factory.create(self.store, index, reader) {
            Ok(entity) => Some(Ok(Arc::new(entity))),
            Err(err) => {
                self.reader = None;
                self.remaining = 0;
                Some(Err(err))
            }
        }
    }
}
