//! Entity Module
//!
//! Base identity contract for every record decoded from a data file, the
//! concrete record types, and the per-version decode factories.
//!
//! ## Identity Model
//!
//! Every entity carries two fields:
//! - `store`: a copyable [`StoreId`] tag naming the store it was decoded
//!   from. Used for identity and debugging only, never for lifetime
//!   management — entities hold no pointer back into the store.
//! - `index`: the entity's unique key within its section. For fixed-width
//!   sections this is the ordinal position; for variable-width sections it
//!   is the byte offset of the record within the section.
//!
//! Ordering, equality, and hashing are defined solely by `index`. Comparing
//! entities drawn from different stores is undefined: indexes collide across
//! stores by design, and callers must not mix entities from two stores in
//! one ordered collection or hash table. The library does not detect or
//! correct such mixing.

mod factory;
mod types;

use std::cmp::Ordering;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

pub use factory::{
    ComponentFactory, EntityFactory, FactorySet, IntegerFactory, MapFactory, NodeFactoryV31,
    NodeFactoryV32, ProfileFactory, ProfileOffsetFactory, PropertyFactory, SignatureFactoryV31,
    SignatureFactoryV32, StringFactory, ValueFactory,
};
pub use types::{
    AsciiString, Component, IntegerEntity, Map, Node, NodeChild, NodeSignatures, Profile,
    ProfileOffset, Property, Signature, SignatureNodes, Value,
};

pub(crate) use types::NO_INDEX;

// =============================================================================
// Store Identity Tag
// =============================================================================

/// Opaque identifier of a loaded store instance.
///
/// Monotonically assigned at load time; two stores loaded from the same file
/// get distinct ids. Carried by every entity as a non-owning back-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(u64);

impl StoreId {
    /// Allocate the next store id (process-wide)
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        StoreId(NEXT.fetch_add(1, AtomicOrdering::Relaxed))
    }
}

// =============================================================================
// Entity Contract
// =============================================================================

/// Base contract shared by every decoded record
pub trait Entity: Send + Sync + 'static {
    /// The entity's unique key within its section (ordinal position for
    /// fixed-width sections, byte offset for variable-width sections)
    fn index(&self) -> u32;

    /// The store this entity was decoded from (identity/debugging only)
    fn store(&self) -> StoreId;

    /// Compare this entity against a raw index
    fn compare_index(&self, other: u32) -> Ordering {
        self.index().cmp(&other)
    }
}

/// Implements `Entity` plus index-only identity (`PartialEq`, `Eq`,
/// `PartialOrd`, `Ord`, `Hash`) for a record type with `store` and `index`
/// fields. Hashing writes the raw index; cross-store collisions are expected
/// and acceptable under the entity contract.
macro_rules! impl_entity_identity {
    ($ty:ty) => {
        impl crate::entity::Entity for $ty {
            fn index(&self) -> u32 {
                self.index
            }

            fn store(&self) -> crate::entity::StoreId {
                self.store
            }
        }

        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.index == other.index
            }
        }

        impl Eq for $ty {}

        impl PartialOrd for $ty {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $ty {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                self.index.cmp(&other.index)
            }
        }

        impl std::hash::Hash for $ty {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                state.write_u32(self.index);
            }
        }
    };
}

pub(crate) use impl_entity_identity;

// =============================================================================
// ASCII Numeric Helpers
// =============================================================================

/// Powers of ten for [`parse_ascii_digits`]; index = the digit's distance
/// from the end of the window.
const POWERS: [u32; 5] = [1, 10, 100, 1_000, 10_000];

/// Returns true for ASCII `'0'..='9'`
#[inline]
pub fn is_ascii_numeral(byte: u8) -> bool {
    byte.is_ascii_digit()
}

/// Convert up to 5 trailing ASCII decimal digits to an integer.
///
/// Reads `length` bytes of `bytes` starting at `start` and folds the decimal
/// digits among them into a number. Only the low-order 5 digits participate:
/// an input of 6 or more digits silently drops the leading ones, so
/// `parse_ascii_digits(b"123456", 0, 6)` returns `23456`. This truncation is
/// part of the contract and relied on by callers comparing version suffixes.
///
/// Scanning runs from the end of the window toward the start and stops at
/// the first non-digit byte, so `parse_ascii_digits(b"v1.25", 0, 5)` is 25.
pub fn parse_ascii_digits(bytes: &[u8], start: usize, length: usize) -> u32 {
    let end = start.saturating_add(length).min(bytes.len());
    let window = &bytes[start.min(bytes.len())..end];

    let mut value: u32 = 0;
    let mut place = 0usize;
    for &byte in window.iter().rev() {
        if !is_ascii_numeral(byte) {
            break;
        }
        if place < POWERS.len() {
            value += u32::from(byte - b'0') * POWERS[place];
        }
        place += 1;
    }
    value
}
