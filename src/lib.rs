//! # devicedb
//!
//! A read-only entity store over versioned binary data files, built for
//! high-volume device-identification lookups:
//! - Custom versioned container format (two supported layout variants)
//! - Lazy paging with bounded LRU caches for the large sections
//! - Eager materialization for the small always-hot sections
//! - A pool of reusable stream readers shared across query threads
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Query Threads                            │
//! │              (one per inbound lookup request)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ get(i) / range(i, n)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Store                                 │
//! │   eager: components, maps, properties, roots, offsets        │
//! │   lazy:  strings, values, profiles, signatures, nodes        │
//! └──────┬──────────────────────────────┬───────────────────────┘
//!        │                              │
//!        ▼                              ▼
//! ┌─────────────┐               ┌──────────────┐
//! │  LRU Cache  │── on miss ──▶ │ Section List │
//! │ (per list)  │               │ (fixed/var)  │
//! └─────────────┘               └──────┬───────┘
//!                                      │ borrow
//!                               ┌──────▼───────┐
//!                               │ Reader Pool  │
//!                               │ (file/bytes) │
//!                               └──────────────┘
//! ```
//!
//! A store is loaded once, single-threaded, then queried concurrently for
//! the rest of its life. Construction goes through [`Store::from_bytes`],
//! [`Store::open`], or [`Store::open_temporary`].

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod entity;
pub mod fixture;
pub mod list;
pub mod reader;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use config::Config;
pub use error::{Result, StoreError};
pub use store::{FormatVersion, Store};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of devicedb
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
