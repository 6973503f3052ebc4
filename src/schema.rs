//! Schema intermediate representation: records, variants, fields, the
//! primitive width rules and the crate error type.
//!
//! Schemas are arena-allocated per module; a [`RecordId`]/[`VariantId`] is an
//! index into the owning module's arena, so a cache hit hands back the same
//! schema (never a duplicate).

use crate::ident::{snake_case, upper_camel_case};
use crate::wrapper::TlvWrapper;

pub type RecordId = usize;
pub type VariantId = usize;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("atom `{name}` is {bits} bits wide; primitives top out at 32 bits")]
    PrimitiveWidthOverflow { name: String, bits: u64 },
    #[error("buffer field `{name}` is {bits} bits; a byte-count directive needs whole bytes")]
    BufferBitMisalignment { name: String, bits: u64 },
    #[error("tagged wrapper `{0}`: first child must be an unsigned atom named `T` with a value")]
    MalformedTagChild(String),
    #[error("unexpected node shape: {0}")]
    UnexpectedNode(String),
    #[error("no decoded value for `{0}`")]
    MissingValue(String),
    #[error("top-level field `{0}` is not TLV-wrapped")]
    UnwrappedRootField(String),
    #[error("payload `{0}` decodes under neither message direction")]
    AmbiguousMessageClass(String),
    #[error("payload decodes to `{0}`, which is not a message class in this run")]
    UnknownClass(String),
    #[error("bad hex payload `{0}`")]
    BadHex(String),
}

/// Primitive payload types. Integer widths are the smallest of {8, 16, 32}
/// that fits the declared bit length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    U8,
    U16,
    U32,
    Bytes,
}

impl Primitive {
    /// Smallest unsigned width holding `bits`; widths above 32 are rejected.
    pub fn for_bit_len(name: &str, bits: u64) -> Result<Primitive, SchemaError> {
        if bits <= 8 {
            Ok(Primitive::U8)
        } else if bits <= 16 {
            Ok(Primitive::U16)
        } else if bits <= 32 {
            Ok(Primitive::U32)
        } else {
            Err(SchemaError::PrimitiveWidthOverflow {
                name: name.to_string(),
                bits,
            })
        }
    }

    /// Multi-byte integers decode big-endian in this protocol family.
    pub fn is_big_endian(self) -> bool {
        matches!(self, Primitive::U16 | Primitive::U32)
    }

    pub fn rust_type_name(self) -> &'static str {
        match self {
            Primitive::U8 => "u8",
            Primitive::U16 => "u16",
            Primitive::U32 => "u32",
            Primitive::Bytes => "Vec<u8>",
        }
    }
}

/// Payload type of one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    /// No modeled payload (unsupported inner shape, or tag-only indicator).
    Unit,
    Primitive(Primitive),
    Record(RecordId),
    Variant(VariantId),
}

/// One field of a record, with everything directive derivation needs.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    /// snake_case name (may gain a suffix from duplicate resolution).
    pub name: String,
    pub ty: FieldType,
    pub wrapper: Option<TlvWrapper>,
    /// Explicit bit length, when the wrapper does not imply one.
    pub bit_len: Option<u64>,
    /// Spare bits to skip immediately before this field.
    pub pad_bits_before: Option<u64>,
    /// Conditionally present depending on how many bytes remain.
    pub optional: bool,
    /// Trailing buffer that consumes all remaining bytes.
    pub final_buffer: bool,
    /// Index into the source node's child list, for assertion projection.
    /// `None` for fields without a usable source value.
    pub source_index: Option<usize>,
}

impl FieldDescriptor {
    pub fn new(label: &str, ty: FieldType) -> Self {
        FieldDescriptor {
            name: snake_case(label),
            ty,
            wrapper: None,
            bit_len: None,
            pad_bits_before: None,
            optional: false,
            final_buffer: false,
            source_index: None,
        }
    }
}

/// A generated record type.
#[derive(Debug, Clone)]
pub struct RecordSchema {
    /// UpperCamel name, unique within the module.
    pub name: String,
    pub fields: Vec<FieldDescriptor>,
    /// Variable-sized bitfield whose fields are parsed while bytes remain.
    pub variable_bitfield: bool,
}

impl RecordSchema {
    pub fn new(label: &str) -> Self {
        let name = upper_camel_case(label);
        // TODO: replace this name-sniffing with an explicit annotation on the
        // source node once the producer can supply one.
        let variable_bitfield =
            name.ends_with("Cap") || name == "EPSNetFeat" || name == "APNAMBR";
        RecordSchema {
            name,
            fields: Vec::new(),
            variable_bitfield,
        }
    }

    /// Append a field; fields of a variable bitfield are all optional.
    pub fn push_field(&mut self, mut field: FieldDescriptor) {
        if self.variable_bitfield {
            field.optional = true;
        }
        self.fields.push(field);
    }

    pub fn has_final_buffer(&self) -> bool {
        self.fields.last().is_some_and(|f| f.final_buffer)
    }

    /// Whether decoding this record requires the caller to supply the total
    /// byte size it may consume.
    pub fn needs_length_context(&self) -> bool {
        self.variable_bitfield || self.has_final_buffer()
    }

    /// Disambiguate repeated field names by suffixing each occurrence with
    /// its 1-based index among the duplicates, rescanning until unique.
    /// Provenance indices are untouched. Idempotent on an already-unique
    /// record.
    pub fn fix_duplicate_names(&mut self) {
        while let Some(dupe) = self.first_duplicate_name() {
            let mut occurrence = 0;
            for field in self.fields.iter_mut().filter(|f| f.name == dupe) {
                occurrence += 1;
                field.name = format!("{}_{}", field.name, occurrence);
            }
        }
    }

    fn first_duplicate_name(&self) -> Option<String> {
        for field in &self.fields {
            let count = self.fields.iter().filter(|f| f.name == field.name).count();
            if count > 1 {
                return Some(field.name.clone());
            }
        }
        None
    }
}

/// One case of a variant: a synthesized name and every integer value that
/// maps to it (dictionary entries whose labels synthesize identically merge).
#[derive(Debug, Clone)]
pub struct VariantCase {
    pub name: String,
    pub values: Vec<u64>,
}

/// A generated tagged-union type over an integer field, with an implicit
/// catch-all case.
#[derive(Debug, Clone)]
pub struct VariantSchema {
    /// UpperCamel name, unique within the module (prefixed by its owner).
    pub name: String,
    /// Underlying integer width.
    pub prim: Primitive,
    /// Declared bit length on the wire.
    pub bit_len: u64,
    pub cases: Vec<VariantCase>,
}

impl VariantSchema {
    /// Build from a dictionary-bearing atom; `prefix` scopes the name to the
    /// defining record or element.
    pub fn from_dict(
        prefix: &str,
        label: &str,
        bit_len: u64,
        dict: &[(u64, String)],
    ) -> Result<Self, SchemaError> {
        let prim = Primitive::for_bit_len(label, bit_len)?;
        let mut schema = VariantSchema {
            name: upper_camel_case(&format!("{}{}", prefix, label)),
            prim,
            bit_len,
            cases: Vec::new(),
        };
        for (value, case_label) in dict {
            schema.push_case(upper_camel_case(case_label), *value);
        }
        Ok(schema)
    }

    /// Add a case value, merging into an existing case of the same name.
    pub fn push_case(&mut self, name: String, value: u64) {
        if let Some(existing) = self.cases.iter_mut().find(|c| c.name == name) {
            existing.values.push(value);
        } else {
            self.cases.push(VariantCase {
                name,
                values: vec![value],
            });
        }
    }

    /// Case matching a concrete value, by membership.
    pub fn case_for_value(&self, value: u64) -> Option<&VariantCase> {
        self.cases.iter().find(|c| c.values.contains(&value))
    }
}
