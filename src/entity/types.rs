//! Concrete record types decoded from data-file sections.
//!
//! All types are immutable after decode and shared across threads as
//! `Arc<T>` once they pass through a cache-backed list. Index slots holding
//! [`NO_INDEX`] mean "unused" and are stripped during decode where a record
//! pads a fixed-width layout.

use crate::entity::{impl_entity_identity, parse_ascii_digits, StoreId};

/// Sentinel for an unused index slot in a fixed-width record
pub(crate) const NO_INDEX: u32 = u32::MAX;

// =============================================================================
// Strings
// =============================================================================

/// One entry of the string section: raw ASCII bytes.
///
/// Index is the byte offset of the record within the section.
#[derive(Debug, Clone)]
pub struct AsciiString {
    pub(crate) store: StoreId,
    pub(crate) index: u32,
    pub(crate) bytes: Box<[u8]>,
}

impl AsciiString {
    /// The raw bytes of the string
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The string as UTF-8 (lossy; section contents are ASCII by contract)
    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }

    /// Length of the string in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Numeric value of the trailing decimal digits, if any.
    ///
    /// Uses [`parse_ascii_digits`], so at most the low-order 5 digits
    /// participate. Returns `None` when the string does not end in a digit.
    pub fn trailing_digits(&self) -> Option<u32> {
        match self.bytes.last() {
            Some(b) if b.is_ascii_digit() => {
                Some(parse_ascii_digits(&self.bytes, 0, self.bytes.len()))
            }
            _ => None,
        }
    }
}

impl_entity_identity!(AsciiString);

// =============================================================================
// Components, Maps, Properties, Values
// =============================================================================

/// A hardware/software component grouping related properties
#[derive(Debug, Clone)]
pub struct Component {
    pub(crate) store: StoreId,
    pub(crate) index: u32,
    /// Stable component id carried in the data file
    pub component_id: u8,
    /// String-section offset of the component name
    pub name_offset: u32,
    /// Index into the profile-offsets section of the default profile
    pub default_profile_offset: u32,
}

impl_entity_identity!(Component);

/// A named map entry (data-file level grouping of properties)
#[derive(Debug, Clone)]
pub struct Map {
    pub(crate) store: StoreId,
    pub(crate) index: u32,
    /// String-section offset of the map name
    pub name_offset: u32,
}

impl_entity_identity!(Map);

/// A detectable property (e.g. browser name, hardware model)
#[derive(Debug, Clone)]
pub struct Property {
    pub(crate) store: StoreId,
    pub(crate) index: u32,
    /// Index of the owning component
    pub component_index: u8,
    /// Raw value-type tag carried in the data file
    pub value_type: u8,
    /// String-section offset of the property name
    pub name_offset: u32,
    /// Value-section index of the default value
    pub default_value_index: u32,
    /// First value-section index belonging to this property
    pub first_value_index: u32,
    /// Last value-section index belonging to this property (inclusive)
    pub last_value_index: u32,
}

impl Property {
    /// Number of values belonging to this property
    pub fn value_count(&self) -> u32 {
        self.last_value_index - self.first_value_index + 1
    }
}

impl_entity_identity!(Property);

/// One possible value of a property
#[derive(Debug, Clone)]
pub struct Value {
    pub(crate) store: StoreId,
    pub(crate) index: u32,
    /// Index of the owning property
    pub property_index: u16,
    /// String-section offset of the value text
    pub name_offset: u32,
    /// String-section offset of the description, or `u32::MAX` if absent
    pub description_offset: u32,
    /// String-section offset of the related URL, or `u32::MAX` if absent
    pub url_offset: u32,
}

impl Value {
    pub fn has_description(&self) -> bool {
        self.description_offset != NO_INDEX
    }

    pub fn has_url(&self) -> bool {
        self.url_offset != NO_INDEX
    }
}

impl_entity_identity!(Value);

// =============================================================================
// Profiles
// =============================================================================

/// A set of property values describing one device/browser/platform.
///
/// Index is the byte offset of the record within the profiles section.
#[derive(Debug, Clone)]
pub struct Profile {
    pub(crate) store: StoreId,
    pub(crate) index: u32,
    /// Index of the owning component
    pub component_index: u8,
    /// Stable profile id (survives data-file updates, unlike offsets)
    pub profile_id: u32,
    /// Value-section indexes, ascending
    pub value_indexes: Box<[u32]>,
}

impl_entity_identity!(Profile);

// =============================================================================
// Signatures
// =============================================================================

/// How a signature refers to its nodes; layout differs between format
/// versions, resolved at decode time by the version-matched factory.
#[derive(Debug, Clone)]
pub enum SignatureNodes {
    /// Node offsets stored inline in the signature record
    Inline(Box<[u32]>),
    /// Node offsets stored in the signature-node-offsets section
    Indexed {
        node_count: u8,
        first_node_offset_index: u32,
        rank: u32,
        flags: u8,
    },
}

/// An ordered set of nodes that together identify a set of profiles
#[derive(Debug, Clone)]
pub struct Signature {
    pub(crate) store: StoreId,
    pub(crate) index: u32,
    /// Profile-offset indexes, one per component at most; unused slots
    /// stripped at decode
    pub profile_indexes: Box<[u32]>,
    /// Version-dependent node reference
    pub nodes: SignatureNodes,
}

impl Signature {
    /// Number of nodes this signature spans
    pub fn node_count(&self) -> usize {
        match &self.nodes {
            SignatureNodes::Inline(offsets) => offsets.len(),
            SignatureNodes::Indexed { node_count, .. } => usize::from(*node_count),
        }
    }
}

impl_entity_identity!(Signature);

// =============================================================================
// Graph Nodes
// =============================================================================

/// A child edge of a node: the character sequence to match and the node it
/// leads to. A negative `node_offset` marks a leaf edge.
#[derive(Debug, Clone, Copy)]
pub struct NodeChild {
    /// String-section offset of the character sequence
    pub character_offset: u32,
    /// Offset of the child node within the nodes section
    pub node_offset: i32,
}

/// How a node refers to the signatures it participates in
#[derive(Debug, Clone)]
pub enum NodeSignatures {
    /// Ranked signature indexes stored inline in the node record
    Inline(Box<[u32]>),
    /// A run within the node-ranked-signature-indexes section
    Indexed { count: u16, first_index: u32 },
}

/// One node of the match graph.
///
/// Index is the byte offset of the record within the nodes section.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) store: StoreId,
    pub(crate) index: u32,
    /// Offset of the parent node, or negative for a root
    pub parent_offset: i32,
    /// Offset of this node's root
    pub root_offset: i32,
    /// Position of this node's characters within the request string
    pub character_position: i16,
    /// Child edges ordered by character sequence
    pub children: Box<[NodeChild]>,
    /// Version-dependent signature reference
    pub signatures: NodeSignatures,
}

impl Node {
    pub fn is_root(&self) -> bool {
        self.parent_offset < 0
    }

    /// Number of ranked signatures this node participates in
    pub fn signature_count(&self) -> usize {
        match &self.signatures {
            NodeSignatures::Inline(indexes) => indexes.len(),
            NodeSignatures::Indexed { count, .. } => usize::from(*count),
        }
    }
}

impl_entity_identity!(Node);

// =============================================================================
// Integer and Offset Records
// =============================================================================

/// A bare u32 record; used by the root-node, ranked-signature-index,
/// signature-node-offset, and node-ranked-signature-index sections.
#[derive(Debug, Clone, Copy)]
pub struct IntegerEntity {
    pub(crate) store: StoreId,
    pub(crate) index: u32,
    pub value: u32,
}

impl_entity_identity!(IntegerEntity);

/// Maps a stable profile id to the profile's byte offset
#[derive(Debug, Clone, Copy)]
pub struct ProfileOffset {
    pub(crate) store: StoreId,
    pub(crate) index: u32,
    /// Stable profile id
    pub profile_id: u32,
    /// Byte offset of the profile within the profiles section
    pub offset: u32,
}

impl_entity_identity!(ProfileOffset);
