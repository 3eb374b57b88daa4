//! Fixed-Width Section List
//!
//! O(1) random access over same-length records: the byte position of entry
//! `i` is `start_position + entry_length * i`, so no auxiliary index is
//! needed. Small always-resident sections are eagerly materialized at load;
//! everything else decodes on demand through a pooled reader.

use std::sync::{Arc, OnceLock};

use crate::entity::{Entity, EntityFactory, StoreId};
use crate::error::{Result, StoreError};
use crate::list::{EntityRange, SectionHeader, SectionList};
use crate::reader::{PooledReader, Reader, ReaderPool};

/// Section list over records of one shared byte length
pub struct FixedList<T: Entity> {
    store: StoreId,
    header: SectionHeader,
    /// Record byte length, supplied by the factory
    entry_length: u32,
    factory: Arc<dyn EntityFactory<T>>,
    pool: Arc<ReaderPool>,
    /// Set once by `materialize`; afterwards gets never touch the pool
    entries: OnceLock<Vec<Arc<T>>>,
}

impl<T: Entity> FixedList<T> {
    /// Build a list over the described section.
    ///
    /// Fails with `MalformedHeader` if the factory is not fixed-width or
    /// the section does not fit inside the source.
    pub fn new(
        store: StoreId,
        header: SectionHeader,
        factory: Arc<dyn EntityFactory<T>>,
        pool: Arc<ReaderPool>,
        name: &str,
    ) -> Result<Self> {
        let entry_length = factory.entry_length().ok_or_else(|| {
            StoreError::malformed(format!(
                "section '{}' requires a fixed-width factory",
                name
            ))
        })?;
        header.validate_fixed(entry_length, pool.source().len(), name)?;

        Ok(Self {
            store,
            header,
            entry_length,
            factory,
            pool,
            entries: OnceLock::new(),
        })
    }

    /// The section descriptor this list was built from
    pub fn header(&self) -> &SectionHeader {
        &self.header
    }

    /// Record byte length
    pub fn entry_length(&self) -> u32 {
        self.entry_length
    }

    /// Whether the section has been eagerly decoded into memory
    pub fn is_materialized(&self) -> bool {
        self.entries.get().is_some()
    }

    /// Eagerly decode every record into memory.
    ///
    /// Used once at load time for small always-resident sections; the
    /// borrowed reader belongs to the loader, not this list. A second call
    /// is a no-op.
    pub fn materialize(&self, reader: &mut Reader) -> Result<()> {
        if self.is_materialized() {
            return Ok(());
        }

        reader.seek(self.header.start_position)?;
        let mut entries = Vec::with_capacity(self.header.count as usize);
        for index in 0..self.header.count {
            entries.push(Arc::new(self.factory.create(self.store, index, reader)?));
        }
        let _ = self.entries.set(entries);
        Ok(())
    }

    fn position_of(&self, index: u32) -> u64 {
        self.header.start_position + u64::from(self.entry_length) * u64::from(index)
    }
}

impl<T: Entity> SectionList<T> for FixedList<T> {
    fn count(&self) -> u32 {
        self.header.count
    }

    fn get(&self, index: u32) -> Result<Arc<T>> {
        if index >= self.header.count {
            return Err(StoreError::OutOfRange {
                index,
                count: self.header.count,
            });
        }

        if let Some(entries) = self.entries.get() {
            return Ok(Arc::clone(&entries[index as usize]));
        }

        let mut reader = self.pool.acquire()?;
        reader.seek(self.position_of(index))?;
        Ok(Arc::new(self.factory.create(self.store, index, &mut reader)?))
    }

    fn range(&self, index: u32, count: u32) -> Result<EntityRange<'_, T>> {
        let end = index.checked_add(count).filter(|&end| end <= self.header.count);
        let end = end.ok_or(StoreError::OutOfRange {
            index: index.saturating_add(count),
            count: self.header.count,
        })?;

        if let Some(entries) = self.entries.get() {
            let slice = &entries[index as usize..end as usize];
            return Ok(Box::new(slice.iter().cloned().map(Ok)));
        }

        // One reader for the whole traversal; records are contiguous so a
        // single seek up front suffices
        let mut reader = self.pool.acquire()?;
        reader.seek(self.position_of(index))?;

        Ok(Box::new(FixedRange {
            store: self.store,
            factory: Arc::clone(&self.factory),
            reader: Some(reader),
            next_index: index,
            end_index: end,
        }))
    }
}

/// Streaming traversal over a fixed-width section.
///
/// Holds its pooled reader in an `Option` so the reader returns to the pool
/// as soon as the traversal finishes or fails, not only when the iterator
/// value is eventually dropped. Early drop releases through the guard.
struct FixedRange<T: Entity> {
    store: StoreId,
    factory: Arc<dyn EntityFactory<T>>,
    reader: Option<PooledReader>,
    next_index: u32,
    end_index: u32,
}

impl<T: Entity> Iterator for FixedRange<T> {
    type Item = Result<Arc<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_index >= self.end_index {
            self.reader = None;
            return None;
        }
        let reader = self.reader.as_mut()?;

        let index = self.next_index;
        self.next_index += 1;

        match self.factory.create(self.store, index, reader) {
            Ok(entity) => Some(Ok(Arc::new(entity))),
            Err(err) => {
                // A failed traversal is done; release the reader now
                self.reader = None;
                self.next_index = self.end_index;
                Some(Err(err))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.end_index - self.next_index) as usize;
        (remaining, Some(remaining))
    }
}
