//! Entity factories and format versioning.
//!
//! Each entity type has one factory per supported binary format version.
//! A factory decodes exactly one record from a positioned reader and, for
//! fixed-width layouts, reports the record byte length. List mechanics are
//! fully version-agnostic: a list only ever calls into whichever factory
//! the loader selected, which is what lets one list implementation serve
//! structurally incompatible layouts for the same logical entity kind.
//!
//! The loader assembles a [`FactorySet`] once per load from the format
//! version and the header constants (profiles-per-signature,
//! nodes-per-signature for the older layout).

use std::sync::Arc;

use crate::entity::types::NO_INDEX;
use crate::entity::{
    AsciiString, Component, Entity, IntegerEntity, Map, Node, NodeChild, NodeSignatures, Profile,
    ProfileOffset, Property, Signature, SignatureNodes, StoreId, Value,
};
use crate::error::{Result, StoreError};
use crate::reader::Reader;
use crate::store::FormatVersion;

// =============================================================================
// Factory Contract
// =============================================================================

/// Decodes one entity of type `T` from a positioned reader
pub trait EntityFactory<T: Entity>: Send + Sync {
    /// Decode the record at the reader's current position.
    ///
    /// `index` is the entity's key within its section (ordinal or byte
    /// offset); the factory records it, it does not derive it.
    fn create(&self, store: StoreId, index: u32, reader: &mut Reader) -> Result<T>;

    /// Record byte length for fixed-width layouts, `None` for variable
    fn entry_length(&self) -> Option<u32>;
}

/// Reject a variable record whose announced element count cannot fit in the
/// bytes remaining in the source. Stops a corrupt count from driving a huge
/// allocation before the read fails anyway.
fn check_remaining(reader: &Reader, elements: u64, element_size: u64) -> Result<()> {
    let remaining = reader.source_len().saturating_sub(reader.position());
    if elements.saturating_mul(element_size) > remaining {
        return Err(StoreError::malformed(format!(
            "record at {} announces {} elements but only {} bytes remain",
            reader.position(),
            elements,
            remaining
        )));
    }
    Ok(())
}

/// Strip trailing unused slots from a fixed-width index list
fn strip_no_index(mut indexes: Vec<u32>) -> Box<[u32]> {
    while indexes.last() == Some(&NO_INDEX) {
        indexes.pop();
    }
    indexes.into_boxed_slice()
}

// =============================================================================
// Strings
// =============================================================================

/// Variable-width: u16 byte length, then ASCII bytes. Same layout in both
/// format versions.
pub struct StringFactory;

impl EntityFactory<AsciiString> for StringFactory {
    fn create(&self, store: StoreId, index: u32, reader: &mut Reader) -> Result<AsciiString> {
        let len = reader.read_u16()?;
        let bytes = reader.read_bytes(usize::from(len))?;
        Ok(AsciiString {
            store,
            index,
            bytes: bytes.into_boxed_slice(),
        })
    }

    fn entry_length(&self) -> Option<u32> {
        None
    }
}

// =============================================================================
// Components, Maps, Properties, Values
// =============================================================================

/// Fixed 9 bytes: component id u8, name offset u32, default profile-offset
/// index u32
pub struct ComponentFactory;

impl EntityFactory<Component> for ComponentFactory {
    fn create(&self, store: StoreId, index: u32, reader: &mut Reader) -> Result<Component> {
        Ok(Component {
            store,
            index,
            component_id: reader.read_u8()?,
            name_offset: reader.read_u32()?,
            default_profile_offset: reader.read_u32()?,
        })
    }

    fn entry_length(&self) -> Option<u32> {
        Some(9)
    }
}

/// Fixed 4 bytes: name offset u32
pub struct MapFactory;

impl EntityFactory<Map> for MapFactory {
    fn create(&self, store: StoreId, index: u32, reader: &mut Reader) -> Result<Map> {
        Ok(Map {
            store,
            index,
            name_offset: reader.read_u32()?,
        })
    }

    fn entry_length(&self) -> Option<u32> {
        Some(4)
    }
}

/// Fixed 18 bytes
pub struct PropertyFactory;

impl EntityFactory<Property> for PropertyFactory {
    fn create(&self, store: StoreId, index: u32, reader: &mut Reader) -> Result<Property> {
        Ok(Property {
            store,
            index,
            component_index: reader.read_u8()?,
            value_type: reader.read_u8()?,
            name_offset: reader.read_u32()?,
            default_value_index: reader.read_u32()?,
            first_value_index: reader.read_u32()?,
            last_value_index: reader.read_u32()?,
        })
    }

    fn entry_length(&self) -> Option<u32> {
        Some(18)
    }
}

/// Fixed 14 bytes
pub struct ValueFactory;

impl EntityFactory<Value> for ValueFactory {
    fn create(&self, store: StoreId, index: u32, reader: &mut Reader) -> Result<Value> {
        Ok(Value {
            store,
            index,
            property_index: reader.read_u16()?,
            name_offset: reader.read_u32()?,
            description_offset: reader.read_u32()?,
            url_offset: reader.read_u32()?,
        })
    }

    fn entry_length(&self) -> Option<u32> {
        Some(14)
    }
}

// =============================================================================
// Profiles
// =============================================================================

/// Variable-width: component index u8, profile id u32, value count u32,
/// then count x u32 value indexes
pub struct ProfileFactory;

impl EntityFactory<Profile> for ProfileFactory {
    fn create(&self, store: StoreId, index: u32, reader: &mut Reader) -> Result<Profile> {
        let component_index = reader.read_u8()?;
        let profile_id = reader.read_u32()?;
        let value_count = reader.read_u32()?;
        check_remaining(reader, u64::from(value_count), 4)?;

        let mut value_indexes = Vec::with_capacity(value_count as usize);
        for _ in 0..value_count {
            value_indexes.push(reader.read_u32()?);
        }

        Ok(Profile {
            store,
            index,
            component_index,
            profile_id,
            value_indexes: value_indexes.into_boxed_slice(),
        })
    }

    fn entry_length(&self) -> Option<u32> {
        None
    }
}

// =============================================================================
// Signatures
// =============================================================================

/// Older layout: profile indexes and node offsets both stored inline, each
/// list padded to a per-file constant width with `u32::MAX`.
pub struct SignatureFactoryV31 {
    pub profiles_per_signature: u8,
    pub nodes_per_signature: u8,
}

impl EntityFactory<Signature> for SignatureFactoryV31 {
    fn create(&self, store: StoreId, index: u32, reader: &mut Reader) -> Result<Signature> {
        let mut profiles = Vec::with_capacity(usize::from(self.profiles_per_signature));
        for _ in 0..self.profiles_per_signature {
            profiles.push(reader.read_u32()?);
        }
        let mut nodes = Vec::with_capacity(usize::from(self.nodes_per_signature));
        for _ in 0..self.nodes_per_signature {
            nodes.push(reader.read_u32()?);
        }

        Ok(Signature {
            store,
            index,
            profile_indexes: strip_no_index(profiles),
            nodes: SignatureNodes::Inline(strip_no_index(nodes)),
        })
    }

    fn entry_length(&self) -> Option<u32> {
        Some((u32::from(self.profiles_per_signature) + u32::from(self.nodes_per_signature)) * 4)
    }
}

/// Newer layout: profile indexes inline, nodes referenced through the
/// signature-node-offsets section, plus rank and flags.
pub struct SignatureFactoryV32 {
    pub profiles_per_signature: u8,
}

impl EntityFactory<Signature> for SignatureFactoryV32 {
    fn create(&self, store: StoreId, index: u32, reader: &mut Reader) -> Result<Signature> {
        let mut profiles = Vec::with_capacity(usize::from(self.profiles_per_signature));
        for _ in 0..self.profiles_per_signature {
            profiles.push(reader.read_u32()?);
        }
        let node_count = reader.read_u8()?;
        let first_node_offset_index = reader.read_u32()?;
        let rank = reader.read_u32()?;
        let flags = reader.read_u8()?;

        Ok(Signature {
            store,
            index,
            profile_indexes: strip_no_index(profiles),
            nodes: SignatureNodes::Indexed {
                node_count,
                first_node_offset_index,
                rank,
                flags,
            },
        })
    }

    fn entry_length(&self) -> Option<u32> {
        Some(u32::from(self.profiles_per_signature) * 4 + 10)
    }
}

// =============================================================================
// Graph Nodes
// =============================================================================

fn read_children(reader: &mut Reader, count: u16) -> Result<Box<[NodeChild]>> {
    check_remaining(reader, u64::from(count), 8)?;
    let mut children = Vec::with_capacity(usize::from(count));
    for _ in 0..count {
        children.push(NodeChild {
            character_offset: reader.read_u32()?,
            node_offset: reader.read_i32()?,
        });
    }
    Ok(children.into_boxed_slice())
}

/// Older layout: ranked signature indexes stored inline after the children
pub struct NodeFactoryV31;

impl EntityFactory<Node> for NodeFactoryV31 {
    fn create(&self, store: StoreId, index: u32, reader: &mut Reader) -> Result<Node> {
        let parent_offset = reader.read_i32()?;
        let root_offset = reader.read_i32()?;
        let character_position = reader.read_i16()?;
        let children_count = reader.read_u16()?;
        let signature_count = reader.read_u16()?;

        let children = read_children(reader, children_count)?;

        check_remaining(reader, u64::from(signature_count), 4)?;
        let mut signatures = Vec::with_capacity(usize::from(signature_count));
        for _ in 0..signature_count {
            signatures.push(reader.read_u32()?);
        }

        Ok(Node {
            store,
            index,
            parent_offset,
            root_offset,
            character_position,
            children,
            signatures: NodeSignatures::Inline(signatures.into_boxed_slice()),
        })
    }

    fn entry_length(&self) -> Option<u32> {
        None
    }
}

/// Newer layout: ranked signatures referenced as a run within the
/// node-ranked-signature-indexes section
pub struct NodeFactoryV32;

impl EntityFactory<Node> for NodeFactoryV32 {
    fn create(&self, store: StoreId, index: u32, reader: &mut Reader) -> Result<Node> {
        let parent_offset = reader.read_i32()?;
        let root_offset = reader.read_i32()?;
        let character_position = reader.read_i16()?;
        let children_count = reader.read_u16()?;
        let ranked_signature_count = reader.read_u16()?;
        let first_ranked_signature_index = reader.read_u32()?;

        let children = read_children(reader, children_count)?;

        Ok(Node {
            store,
            index,
            parent_offset,
            root_offset,
            character_position,
            children,
            signatures: NodeSignatures::Indexed {
                count: ranked_signature_count,
                first_index: first_ranked_signature_index,
            },
        })
    }

    fn entry_length(&self) -> Option<u32> {
        None
    }
}

// =============================================================================
// Integer and Offset Records
// =============================================================================

/// Fixed 4 bytes: a bare u32
pub struct IntegerFactory;

impl EntityFactory<IntegerEntity> for IntegerFactory {
    fn create(&self, store: StoreId, index: u32, reader: &mut Reader) -> Result<IntegerEntity> {
        Ok(IntegerEntity {
            store,
            index,
            value: reader.read_u32()?,
        })
    }

    fn entry_length(&self) -> Option<u32> {
        Some(4)
    }
}

/// Fixed 8 bytes: profile id u32, profile byte offset u32
pub struct ProfileOffsetFactory;

impl EntityFactory<ProfileOffset> for ProfileOffsetFactory {
    fn create(&self, store: StoreId, index: u32, reader: &mut Reader) -> Result<ProfileOffset> {
        Ok(ProfileOffset {
            store,
            index,
            profile_id: reader.read_u32()?,
            offset: reader.read_u32()?,
        })
    }

    fn entry_length(&self) -> Option<u32> {
        Some(8)
    }
}

// =============================================================================
// Version Selection
// =============================================================================

/// The complete factory selection for one loaded store.
///
/// Assembled once by the loader; section lists hold clones of the relevant
/// entry and never re-select by version themselves.
pub struct FactorySet {
    pub strings: Arc<dyn EntityFactory<AsciiString>>,
    pub components: Arc<dyn EntityFactory<Component>>,
    pub maps: Arc<dyn EntityFactory<Map>>,
    pub properties: Arc<dyn EntityFactory<Property>>,
    pub values: Arc<dyn EntityFactory<Value>>,
    pub profiles: Arc<dyn EntityFactory<Profile>>,
    pub signatures: Arc<dyn EntityFactory<Signature>>,
    pub nodes: Arc<dyn EntityFactory<Node>>,
    pub integers: Arc<dyn EntityFactory<IntegerEntity>>,
    pub profile_offsets: Arc<dyn EntityFactory<ProfileOffset>>,
}

impl FactorySet {
    /// Select factories for a format version, capturing the header constants
    /// the fixed signature layout depends on
    pub fn for_version(
        version: FormatVersion,
        profiles_per_signature: u8,
        nodes_per_signature: u8,
    ) -> Self {
        let (signatures, nodes): (
            Arc<dyn EntityFactory<Signature>>,
            Arc<dyn EntityFactory<Node>>,
        ) = match version {
            FormatVersion::V31 => (
                Arc::new(SignatureFactoryV31 {
                    profiles_per_signature,
                    nodes_per_signature,
                }),
                Arc::new(NodeFactoryV31),
            ),
            FormatVersion::V32 => (
                Arc::new(SignatureFactoryV32 {
                    profiles_per_signature,
                }),
                Arc::new(NodeFactoryV32),
            ),
        };

        Self {
            strings: Arc::new(StringFactory),
            components: Arc::new(ComponentFactory),
            maps: Arc::new(MapFactory),
            properties: Arc::new(PropertyFactory),
            values: Arc::new(ValueFactory),
            profiles: Arc::new(ProfileFactory),
            signatures,
            nodes,
            integers: Arc::new(IntegerFactory),
            profile_offsets: Arc::new(ProfileOffsetFactory),
        }
    }
}
