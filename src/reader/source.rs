//! Backing byte source for a store: a local file or an in-memory buffer.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bytes::Bytes;

use crate::error::Result;

/// The flat byte source a store reads from.
///
/// Shared via `Arc` between the store, the reader pool, and every reader
/// the pool creates. Immutable for the lifetime of the store.
#[derive(Debug)]
pub enum Source {
    /// A local file, opened once per pooled reader
    File {
        path: PathBuf,
        len: u64,
        last_modified: Option<SystemTime>,
    },

    /// An in-memory buffer; readers hold zero-copy clones
    Memory(Bytes),
}

impl Source {
    /// Describe a file on disk, capturing its length and last-write time
    pub fn from_file(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path)?;
        Ok(Source::File {
            path: path.to_path_buf(),
            len: metadata.len(),
            last_modified: metadata.modified().ok(),
        })
    }

    /// Wrap an in-memory buffer
    pub fn from_bytes(buffer: impl Into<Bytes>) -> Self {
        Source::Memory(buffer.into())
    }

    /// Total length of the source in bytes
    pub fn len(&self) -> u64 {
        match self {
            Source::File { len, .. } => *len,
            Source::Memory(buf) => buf.len() as u64,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Path of the backing file, if file-backed
    pub fn path(&self) -> Option<&Path> {
        match self {
            Source::File { path, .. } => Some(path),
            Source::Memory(_) => None,
        }
    }

    /// Last-write timestamp of the backing file, if file-backed
    pub fn last_modified(&self) -> Option<SystemTime> {
        match self {
            Source::File { last_modified, .. } => *last_modified,
            Source::Memory(_) => None,
        }
    }
}
