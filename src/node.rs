//! Source-node model: the already-decoded message tree handed to the
//! compiler by the external protocol decoder.
//!
//! A node is either an [`Atom`] (scalar or byte buffer, with a bit length and
//! an optional value dictionary), an [`Envelope`] (ordered children, plus the
//! concrete encoding-class name used for TLV classification), or a
//! [`Composite`] (list/sequence/array shapes the schema compiler does not
//! model). Populated trees additionally carry decoded values and per-node
//! transparency flags; prototype trees used for schema resolution carry the
//! declared structure and any fixed values (tags).

/// One node of the source tree.
#[derive(Debug, Clone)]
pub enum Node {
    Atom(Atom),
    Envelope(Envelope),
    Composite(Composite),
}

/// A leaf: an unsigned integer or byte buffer.
#[derive(Debug, Clone)]
pub struct Atom {
    pub name: String,
    /// Declared width in bits. A buffer with 0 declared bits is a trailing
    /// consume-the-rest field.
    pub bit_len: u64,
    /// Byte-buffer atom (as opposed to an unsigned integer).
    pub buffer: bool,
    /// Value dictionary, in declaration order. Present on enumerated atoms.
    pub dict: Option<Vec<(u64, String)>>,
    /// Set when the value was absent from the payload.
    pub transparent: bool,
    /// Decoded (or fixed) value, if any.
    pub value: Option<AtomValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AtomValue {
    Uint(u64),
    Bytes(Vec<u8>),
}

/// A composite: ordered children under a name. TLV-wrapped elements carry
/// the wrapper's concrete encoding-class name (e.g. `"Type4TLV"`).
#[derive(Debug, Clone)]
pub struct Envelope {
    pub name: String,
    /// Concrete encoding-class name; empty for plain structural envelopes.
    pub encoding_class: String,
    pub children: Vec<Node>,
    /// Declared inner element, for wrappers that store a dedicated one.
    /// When absent the inner value sits at the wrapper kind's value slot
    /// inside `children`.
    pub ie: Option<Box<Node>>,
    pub transparent: bool,
}

/// A list/sequence/array-like shape with no schema counterpart.
#[derive(Debug, Clone)]
pub struct Composite {
    pub name: String,
    pub transparent: bool,
}

impl Atom {
    /// Unsigned integer atom of the given width.
    pub fn uint(name: &str, bit_len: u64) -> Self {
        Atom {
            name: name.to_string(),
            bit_len,
            buffer: false,
            dict: None,
            transparent: false,
            value: None,
        }
    }

    /// Byte-buffer atom of the given width (0 = consume the rest).
    pub fn buf(name: &str, bit_len: u64) -> Self {
        Atom {
            name: name.to_string(),
            bit_len,
            buffer: true,
            dict: None,
            transparent: false,
            value: None,
        }
    }

    pub fn with_dict(mut self, dict: Vec<(u64, &str)>) -> Self {
        self.dict = Some(dict.into_iter().map(|(v, n)| (v, n.to_string())).collect());
        self
    }

    pub fn with_value(mut self, value: AtomValue) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_uint(self, v: u64) -> Self {
        self.with_value(AtomValue::Uint(v))
    }
}

impl Envelope {
    /// Plain structural envelope (no encoding class).
    pub fn plain(name: &str, children: Vec<Node>) -> Self {
        Envelope {
            name: name.to_string(),
            encoding_class: String::new(),
            children,
            ie: None,
            transparent: false,
        }
    }

    /// Envelope carrying a concrete encoding-class name.
    pub fn wrapped(name: &str, encoding_class: &str, children: Vec<Node>) -> Self {
        Envelope {
            name: name.to_string(),
            encoding_class: encoding_class.to_string(),
            children,
            ie: None,
            transparent: false,
        }
    }

    pub fn with_ie(mut self, ie: Node) -> Self {
        self.ie = Some(Box::new(ie));
        self
    }
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Atom(a) => &a.name,
            Node::Envelope(e) => &e.name,
            Node::Composite(c) => &c.name,
        }
    }

    pub fn is_transparent(&self) -> bool {
        match self {
            Node::Atom(a) => a.transparent,
            Node::Envelope(e) => e.transparent,
            Node::Composite(c) => c.transparent,
        }
    }

    /// Current bit length: declared width for atoms, recursive sum for
    /// envelopes, 0 for composites.
    pub fn bit_len(&self) -> u64 {
        match self {
            Node::Atom(a) => a.bit_len,
            Node::Envelope(e) => e.children.iter().map(Node::bit_len).sum(),
            Node::Composite(_) => 0,
        }
    }
}

/// Message direction a payload may decode under. The protocol family encodes
/// the same message type differently per direction, so harvesting tries both.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    MobileOriginated,
    MobileTerminated,
}

/// Seam to the external bit-level decoder: hand it a payload and get back a
/// populated message tree whose root name identifies the message class, or
/// `None` when the payload is not a message of that direction.
pub trait PayloadDecoder {
    fn decode(&self, payload: &[u8], direction: Direction) -> Option<Envelope>;
}
