//! TLV wrapper classification for the nine information-element encodings of
//! 3GPP TS 24.007 (sec 11.2.1.1).
//!
//! Each kind has three properties: *sized* (the inner length is implied by
//! the wrapper, so no size directive is emitted for the value),
//! *variable-length* (a length prefix precedes the value) and *tagged* (a
//! discriminator tag precedes everything). Tagged kinds carry the concrete
//! tag value, read from the wrapper's leading `T` atom.

use crate::node::{AtomValue, Envelope, Node};
use crate::schema::SchemaError;

/// The nine TS 24.007 encoding classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlvKind {
    /// Half-octet value, no tag.
    Type1V,
    /// Half-octet tag + half-octet value in one octet.
    Type1TV,
    /// Tag only (presence indicator).
    Type2,
    /// Fixed-length value, no tag or length.
    Type3V,
    /// Tag + fixed-length value.
    Type3TV,
    /// One-octet length + value.
    Type4LV,
    /// Tag + one-octet length + value.
    Type4TLV,
    /// Two-octet (extended) length + value.
    Type6LVE,
    /// Tag + two-octet (extended) length + value.
    Type6TLVE,
}

impl TlvKind {
    /// Match a concrete encoding-class name against the known kinds.
    pub fn from_class_name(name: &str) -> Option<TlvKind> {
        match name {
            "Type1V" => Some(TlvKind::Type1V),
            "Type1TV" => Some(TlvKind::Type1TV),
            "Type2" => Some(TlvKind::Type2),
            "Type3V" => Some(TlvKind::Type3V),
            "Type3TV" => Some(TlvKind::Type3TV),
            "Type4LV" => Some(TlvKind::Type4LV),
            "Type4TLV" => Some(TlvKind::Type4TLV),
            "Type6LVE" => Some(TlvKind::Type6LVE),
            "Type6TLVE" => Some(TlvKind::Type6TLVE),
            _ => None,
        }
    }

    pub fn class_name(self) -> &'static str {
        match self {
            TlvKind::Type1V => "Type1V",
            TlvKind::Type1TV => "Type1TV",
            TlvKind::Type2 => "Type2",
            TlvKind::Type3V => "Type3V",
            TlvKind::Type3TV => "Type3TV",
            TlvKind::Type4LV => "Type4LV",
            TlvKind::Type4TLV => "Type4TLV",
            TlvKind::Type6LVE => "Type6LVE",
            TlvKind::Type6TLVE => "Type6TLVE",
        }
    }

    /// The inner length is implied by the wrapper (half-octet or
    /// length-prefixed), so the value carries no size directive.
    pub fn is_sized(self) -> bool {
        matches!(
            self,
            TlvKind::Type1V
                | TlvKind::Type1TV
                | TlvKind::Type4LV
                | TlvKind::Type4TLV
                | TlvKind::Type6LVE
                | TlvKind::Type6TLVE
        )
    }

    /// A length prefix is present on the wire.
    pub fn is_variable_length(self) -> bool {
        matches!(
            self,
            TlvKind::Type4LV | TlvKind::Type4TLV | TlvKind::Type6LVE | TlvKind::Type6TLVE
        )
    }

    /// A discriminator tag precedes the value.
    pub fn is_tagged(self) -> bool {
        matches!(
            self,
            TlvKind::Type1TV | TlvKind::Type3TV | TlvKind::Type4TLV | TlvKind::Type6TLVE
        )
    }

    /// Position of the value element among the wrapper's children (after the
    /// tag and/or length elements). `None` for the tag-only indicator kind.
    pub fn inner_slot(self) -> Option<usize> {
        match self {
            TlvKind::Type1V => Some(0),
            TlvKind::Type1TV => Some(1),
            TlvKind::Type2 => None,
            TlvKind::Type3V => Some(0),
            TlvKind::Type3TV => Some(1),
            TlvKind::Type4LV => Some(1),
            TlvKind::Type4TLV => Some(2),
            TlvKind::Type6LVE => Some(1),
            TlvKind::Type6TLVE => Some(2),
        }
    }
}

/// A classified wrapper: the kind plus, for tagged kinds, the tag value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlvWrapper {
    pub kind: TlvKind,
    pub tag: Option<u64>,
}

/// Classify an envelope against the nine encoding classes.
///
/// Returns `Ok(None)` when the envelope's class name matches none of them
/// (the node is then a plain structural element). For tagged kinds the first
/// child must be an unsigned atom named `T` carrying a value; anything else
/// violates the input contract and is fatal.
pub fn classify(env: &Envelope) -> Result<Option<TlvWrapper>, SchemaError> {
    let Some(kind) = TlvKind::from_class_name(&env.encoding_class) else {
        return Ok(None);
    };
    let tag = if kind.is_tagged() {
        match env.children.first() {
            Some(Node::Atom(a)) if a.name == "T" && !a.buffer => match a.value {
                Some(AtomValue::Uint(v)) => Some(v),
                _ => return Err(SchemaError::MalformedTagChild(env.name.clone())),
            },
            _ => return Err(SchemaError::MalformedTagChild(env.name.clone())),
        }
    } else {
        None
    };
    Ok(Some(TlvWrapper { kind, tag }))
}
