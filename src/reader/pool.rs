//! Reader Pool
//!
//! Thread-safe borrowing of readers bound to one backing source.
//!
//! ## Concurrency
//! - `idle`: Protected by a Mutex; held only to push/pop, never across I/O
//! - `created`: Atomic counter (lock-free)
//! - Growth is unbounded: creating a reader is cheap relative to stalling a
//!   query thread, so an empty idle set always yields a fresh reader

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::reader::{Reader, Source};

/// Bag of idle readers plus accounting of total created
pub struct ReaderPool {
    /// The shared byte source every reader binds to
    source: Arc<Source>,

    /// Idle readers awaiting the next borrow
    idle: Mutex<Vec<Reader>>,

    /// Total readers ever created for this pool
    created: AtomicUsize,
}

impl ReaderPool {
    /// Create an empty pool over the source
    pub fn new(source: Arc<Source>) -> Self {
        Self {
            source,
            idle: Mutex::new(Vec::new()),
            created: AtomicUsize::new(0),
        }
    }

    /// Borrow a reader: an idle one if available, otherwise a new one.
    ///
    /// The returned guard releases the reader back to the idle set when
    /// dropped. No two concurrent borrows receive the same instance.
    pub fn acquire(self: &Arc<Self>) -> Result<PooledReader> {
        let idle = self.idle.lock().pop();
        let reader = match idle {
            Some(reader) => reader,
            None => {
                let reader = Reader::open(&self.source)?;
                self.created.fetch_add(1, Ordering::Relaxed);
                reader
            }
        };
        Ok(PooledReader {
            reader: Some(reader),
            pool: Arc::clone(self),
        })
    }

    /// Return a reader to the idle set
    fn release(&self, reader: Reader) {
        self.idle.lock().push(reader);
    }

    /// The shared byte source
    pub fn source(&self) -> &Arc<Source> {
        &self.source
    }

    /// Total readers ever created
    pub fn readers_created(&self) -> usize {
        self.created.load(Ordering::Relaxed)
    }

    /// Readers currently idle (not borrowed)
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }
}

/// RAII borrow of a pooled reader.
///
/// Dereferences to [`Reader`]; returns the reader to the pool on drop, on
/// every exit path — normal completion, early termination of a range
/// traversal, or a propagated failure.
pub struct PooledReader {
    reader: Option<Reader>,
    pool: Arc<ReaderPool>,
}

impl Deref for PooledReader {
    type Target = Reader;

    fn deref(&self) -> &Reader {
        // Invariant: `reader` is Some until drop
        self.reader.as_ref().expect("pooled reader already released")
    }
}

impl DerefMut for PooledReader {
    fn deref_mut(&mut self) -> &mut Reader {
        self.reader.as_mut().expect("pooled reader already released")
    }
}

impl Drop for PooledReader {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            self.pool.release(reader);
        }
    }
}
