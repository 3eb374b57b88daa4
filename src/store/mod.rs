//! Store Module
//!
//! The loaded, query-ready entity store.
//!
//! ## Responsibilities
//! - Construct from a byte buffer or a file path (optionally temporary)
//! - Own the reader pool and every section list
//! - Expose indexed/ranged retrieval per section plus cache statistics
//! - On drop, release the pool and delete a temporary source file
//!
//! Structure is immutable once loaded: concurrent readers contend only on
//! the section caches and the pool's idle set.

pub(crate) mod header;
mod loader;

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use bytes::Bytes;

pub use header::{DataHeader, FormatVersion};

use crate::config::Config;
use crate::entity::{
    AsciiString, Component, IntegerEntity, Map, Node, Profile, ProfileOffset, Property, Signature,
    StoreId, Value,
};
use crate::error::Result;
use crate::list::{CachedList, FixedList};
use crate::reader::{ReaderPool, Source};
use crate::store::loader::StoreLoader;
use std::sync::Arc;

/// A loaded data file: all section lists, the reader pool, and metadata.
///
/// Queries are synchronous, blocking calls safe from any number of threads.
/// Entities decoded by one store must never be compared or hashed against
/// entities from another; indexes collide across stores by design.
pub struct Store {
    pub(crate) id: StoreId,
    pub(crate) version: FormatVersion,
    pub(crate) published: i64,
    pub(crate) source: Arc<Source>,
    pub(crate) pool: Arc<ReaderPool>,
    /// Delete the backing file when the store is dropped
    pub(crate) delete_on_drop: bool,

    pub(crate) strings: CachedList<AsciiString>,
    pub(crate) components: FixedList<Component>,
    pub(crate) maps: FixedList<Map>,
    pub(crate) properties: FixedList<Property>,
    pub(crate) values: CachedList<Value>,
    pub(crate) profiles: CachedList<Profile>,
    pub(crate) signatures: CachedList<Signature>,
    pub(crate) signature_node_offsets: Option<CachedList<IntegerEntity>>,
    pub(crate) node_ranked_signature_indexes: Option<CachedList<IntegerEntity>>,
    pub(crate) ranked_signature_indexes: CachedList<IntegerEntity>,
    pub(crate) nodes: CachedList<Node>,
    pub(crate) root_nodes: FixedList<IntegerEntity>,
    pub(crate) profile_offsets: FixedList<ProfileOffset>,
}

impl Store {
    // =========================================================================
    // Construction
    // =========================================================================

    /// Load a store from an in-memory buffer
    pub fn from_bytes(buffer: impl Into<Bytes>) -> Result<Self> {
        Self::from_bytes_with_config(buffer, Config::default())
    }

    /// Load a store from an in-memory buffer with explicit cache sizing
    pub fn from_bytes_with_config(buffer: impl Into<Bytes>, config: Config) -> Result<Self> {
        StoreLoader::load(Source::from_bytes(buffer), config, false)
    }

    /// Load a store from a file, capturing its last-write timestamp
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, Config::default())
    }

    /// Load a store from a file with explicit cache sizing
    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        StoreLoader::load(Source::from_file(path.as_ref())?, config, false)
    }

    /// Load a store from a temporary file, deleted when the store drops.
    ///
    /// Used by refresh flows that download a new data file next to the old
    /// one and hand ownership of the copy to the store.
    pub fn open_temporary(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_temporary_with_config(path, Config::default())
    }

    /// Temporary-file variant with explicit cache sizing
    pub fn open_temporary_with_config(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        StoreLoader::load(Source::from_file(path.as_ref())?, config, true)
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    /// This store instance's identity tag
    pub fn store_id(&self) -> StoreId {
        self.id
    }

    /// Binary format version of the loaded file
    pub fn format_version(&self) -> FormatVersion {
        self.version
    }

    /// Publication time of the data, unix seconds
    pub fn published(&self) -> i64 {
        self.published
    }

    /// Last-write timestamp of the backing file, if file-backed
    pub fn last_modified(&self) -> Option<SystemTime> {
        self.source.last_modified()
    }

    /// Whether the backing file will be deleted on drop
    pub fn is_temporary(&self) -> bool {
        self.delete_on_drop
    }

    /// Total length of the byte source
    pub fn source_len(&self) -> u64 {
        self.source.len()
    }

    /// Total readers the pool has ever created
    pub fn readers_created(&self) -> usize {
        self.pool.readers_created()
    }

    /// Readers currently idle in the pool
    pub fn idle_readers(&self) -> usize {
        self.pool.idle_count()
    }

    // =========================================================================
    // Section Access
    // =========================================================================

    /// String section (variable-width, offset-indexed, cached)
    pub fn strings(&self) -> &CachedList<AsciiString> {
        &self.strings
    }

    /// Component section (fixed-width, fully resident)
    pub fn components(&self) -> &FixedList<Component> {
        &self.components
    }

    /// Map section (fixed-width, fully resident)
    pub fn maps(&self) -> &FixedList<Map> {
        &self.maps
    }

    /// Property section (fixed-width, fully resident)
    pub fn properties(&self) -> &FixedList<Property> {
        &self.properties
    }

    /// Value section (fixed-width, cached)
    pub fn values(&self) -> &CachedList<Value> {
        &self.values
    }

    /// Profile section (variable-width, offset-indexed, cached)
    pub fn profiles(&self) -> &CachedList<Profile> {
        &self.profiles
    }

    /// Signature section (fixed-width, cached)
    pub fn signatures(&self) -> &CachedList<Signature> {
        &self.signatures
    }

    /// Signature node-offset section; present only in V32 files
    pub fn signature_node_offsets(&self) -> Option<&CachedList<IntegerEntity>> {
        self.signature_node_offsets.as_ref()
    }

    /// Node ranked-signature-index section; present only in V32 files
    pub fn node_ranked_signature_indexes(&self) -> Option<&CachedList<IntegerEntity>> {
        self.node_ranked_signature_indexes.as_ref()
    }

    /// Ranked signature-index section (fixed-width, cached)
    pub fn ranked_signature_indexes(&self) -> &CachedList<IntegerEntity> {
        &self.ranked_signature_indexes
    }

    /// Node section (variable-width, offset-indexed, cached)
    pub fn nodes(&self) -> &CachedList<Node> {
        &self.nodes
    }

    /// Root-node section (fixed-width, fully resident)
    pub fn root_nodes(&self) -> &FixedList<IntegerEntity> {
        &self.root_nodes
    }

    /// Profile-offset section (fixed-width, fully resident)
    pub fn profile_offsets(&self) -> &FixedList<ProfileOffset> {
        &self.profile_offsets
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        if !self.delete_on_drop {
            return;
        }
        if let Some(path) = self.source.path() {
            if let Err(err) = fs::remove_file(path) {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to delete temporary data file"
                );
            }
        }
    }
}
