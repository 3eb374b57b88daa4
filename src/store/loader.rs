//! Store Loader
//!
//! Sequences section construction against the versioned global header.
//!
//! Loading is strictly single-threaded and runs to completion before the
//! store is handed to any caller: queries can never observe a partially
//! built store. Structural failures (bad magic, unrecognized version, CRC
//! mismatch, a descriptor inconsistent with the source length) abort the
//! load; the partially built state is simply dropped.

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::entity::{FactorySet, StoreId};
use crate::error::{Result, StoreError};
use crate::list::{CachedList, FixedList, SectionHeader, VariableList};
use crate::reader::{ReaderPool, Source};
use crate::store::{DataHeader, Store};

/// Load phases, advanced strictly in sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Unloaded,
    HeaderRead,
    SectionsConstructed,
    SmallSectionsMaterialized,
    Ready,
}

/// Single-use loader driving one store construction
pub(crate) struct StoreLoader {
    state: LoadState,
}

impl StoreLoader {
    /// Construct a query-ready store from the source.
    ///
    /// Sequence: read global header → construct every section in dependency
    /// order → eagerly materialize the small always-hot sections → assemble
    /// the store. Each phase borrows the same pooled reader; the pool then
    /// serves query traffic for the store's remaining life.
    pub(crate) fn load(source: Source, config: Config, delete_on_drop: bool) -> Result<Store> {
        let started = Instant::now();
        let source = Arc::new(source);
        let pool = Arc::new(ReaderPool::new(Arc::clone(&source)));
        let store_id = StoreId::next();
        let mut loader = StoreLoader {
            state: LoadState::Unloaded,
        };

        let mut reader = pool.acquire()?;

        // Phase 1: global header (format-version marker selects everything
        // that follows)
        let header = DataHeader::read_from(&mut reader)?;
        loader.advance(LoadState::HeaderRead);
        tracing::debug!(
            version = header.version.marker(),
            published = header.published,
            "read global header"
        );

        if header.strings.start_position < header.version.header_size() {
            return Err(StoreError::malformed(format!(
                "first section starts at {} inside the {}-byte header",
                header.strings.start_position,
                header.version.header_size()
            )));
        }

        // Phase 2: sections, strict dependency order. Each section
        // references only earlier ones by index, never forward.
        let factories = FactorySet::for_version(
            header.version,
            header.profiles_per_signature,
            header.nodes_per_signature,
        );

        trace_section("strings", &header.strings);
        let strings = CachedList::new(
            Box::new(VariableList::new(
                store_id,
                header.strings,
                header.components.start_position,
                Arc::clone(&factories.strings),
                Arc::clone(&pool),
                "strings",
            )?),
            config.string_cache_size,
        );

        trace_section("components", &header.components);
        let components = FixedList::new(
            store_id,
            header.components,
            Arc::clone(&factories.components),
            Arc::clone(&pool),
            "components",
        )?;

        trace_section("maps", &header.maps);
        let maps = FixedList::new(
            store_id,
            header.maps,
            Arc::clone(&factories.maps),
            Arc::clone(&pool),
            "maps",
        )?;

        trace_section("properties", &header.properties);
        let properties = FixedList::new(
            store_id,
            header.properties,
            Arc::clone(&factories.properties),
            Arc::clone(&pool),
            "properties",
        )?;

        trace_section("values", &header.values);
        let values = CachedList::new(
            Box::new(FixedList::new(
                store_id,
                header.values,
                Arc::clone(&factories.values),
                Arc::clone(&pool),
                "values",
            )?),
            config.value_cache_size,
        );

        trace_section("profiles", &header.profiles);
        let profiles = CachedList::new(
            Box::new(VariableList::new(
                store_id,
                header.profiles,
                header.signatures.start_position,
                Arc::clone(&factories.profiles),
                Arc::clone(&pool),
                "profiles",
            )?),
            config.profile_cache_size,
        );

        trace_section("signatures", &header.signatures);
        let signatures = CachedList::new(
            Box::new(FixedList::new(
                store_id,
                header.signatures,
                Arc::clone(&factories.signatures),
                Arc::clone(&pool),
                "signatures",
            )?),
            config.signature_cache_size,
        );

        let signature_node_offsets = match header.signature_node_offsets {
            Some(section) => {
                trace_section("signature_node_offsets", &section);
                Some(CachedList::new(
                    Box::new(FixedList::new(
                        store_id,
                        section,
                        Arc::clone(&factories.integers),
                        Arc::clone(&pool),
                        "signature_node_offsets",
                    )?),
                    config.index_cache_size,
                ))
            }
            None => None,
        };

        let node_ranked_signature_indexes = match header.node_ranked_signature_indexes {
            Some(section) => {
                trace_section("node_ranked_signature_indexes", &section);
                Some(CachedList::new(
                    Box::new(FixedList::new(
                        store_id,
                        section,
                        Arc::clone(&factories.integers),
                        Arc::clone(&pool),
                        "node_ranked_signature_indexes",
                    )?),
                    config.index_cache_size,
                ))
            }
            None => None,
        };

        trace_section("ranked_signature_indexes", &header.ranked_signature_indexes);
        let ranked_signature_indexes = CachedList::new(
            Box::new(FixedList::new(
                store_id,
                header.ranked_signature_indexes,
                Arc::clone(&factories.integers),
                Arc::clone(&pool),
                "ranked_signature_indexes",
            )?),
            config.index_cache_size,
        );

        trace_section("nodes", &header.nodes);
        let nodes = CachedList::new(
            Box::new(VariableList::new(
                store_id,
                header.nodes,
                header.root_nodes.start_position,
                Arc::clone(&factories.nodes),
                Arc::clone(&pool),
                "nodes",
            )?),
            config.node_cache_size,
        );

        trace_section("root_nodes", &header.root_nodes);
        let root_nodes = FixedList::new(
            store_id,
            header.root_nodes,
            Arc::clone(&factories.integers),
            Arc::clone(&pool),
            "root_nodes",
        )?;

        trace_section("profile_offsets", &header.profile_offsets);
        let profile_offsets = FixedList::new(
            store_id,
            header.profile_offsets,
            Arc::clone(&factories.profile_offsets),
            Arc::clone(&pool),
            "profile_offsets",
        )?;

        loader.advance(LoadState::SectionsConstructed);

        // Phase 3: the small always-hot sections become fully resident now;
        // the large ones stay lazily paged behind their caches
        components.materialize(&mut reader)?;
        maps.materialize(&mut reader)?;
        properties.materialize(&mut reader)?;
        root_nodes.materialize(&mut reader)?;
        profile_offsets.materialize(&mut reader)?;
        loader.advance(LoadState::SmallSectionsMaterialized);

        let store = Store {
            id: store_id,
            version: header.version,
            published: header.published,
            source,
            pool,
            delete_on_drop,
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
        };
        loader.advance(LoadState::Ready);
        tracing::info!(
            version = store.version.marker(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "store ready"
        );

        Ok(store)
    }

    /// Move to the next phase; phases never skip or repeat
    fn advance(&mut self, next: LoadState) {
        debug_assert_eq!(
            next as u8,
            self.state as u8 + 1,
            "load state must advance strictly in sequence"
        );
        self.state = next;
    }
}

fn trace_section(name: &str, section: &SectionHeader) {
    tracing::debug!(
        section = name,
        start = section.start_position,
        count = section.count,
        "constructing section"
    );
}
