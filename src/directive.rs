//! Directive derivation: the per-field codec rules the renderer turns into
//! declarative annotations.
//!
//! Directive order is fixed (size/count, then padding, then endianness, then
//! conditional presence with default, then context), so generated output is
//! deterministic and diff-stable.

use crate::resolve::ModuleSchema;
use crate::schema::{FieldDescriptor, FieldType, Primitive, RecordSchema, SchemaError, VariantId};

/// One decode-direction codec directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Read exactly this many bits.
    Bits(u64),
    /// Read exactly this many bytes.
    Bytes(u64),
    /// Buffer of a fixed byte count.
    ByteCount(u64),
    /// Buffer consuming every remaining byte in the current bounds.
    RemainingCount,
    /// Skip this many spare bits before the field.
    PadBefore(u64),
    /// Multi-byte integer, big-endian on the wire.
    BigEndian,
    /// Present only while unread bytes remain.
    PresentIfBytesRemain,
    /// Value to assume when an optional variant field is absent: the
    /// variant's first declared case.
    DefaultCase { variant: VariantId, case: String },
    /// Wrapper tag that must match before the field is consumed.
    TagMatch(u64),
    /// The field's decoder needs the caller's total-size context.
    NeedsSizeContext,
}

/// Derive the ordered directive list for one field.
pub fn derive_field(
    module: &ModuleSchema,
    field: &FieldDescriptor,
) -> Result<Vec<Directive>, SchemaError> {
    let mut out = Vec::new();

    // 1. size / count
    match field.ty {
        FieldType::Primitive(Primitive::Bytes) => {
            if field.final_buffer {
                out.push(Directive::RemainingCount);
            } else if let Some(bits) = field.bit_len {
                if bits % 8 != 0 {
                    return Err(SchemaError::BufferBitMisalignment {
                        name: field.name.clone(),
                        bits,
                    });
                }
                out.push(Directive::ByteCount(bits / 8));
            }
        }
        // a variant reads through its own declared width
        FieldType::Variant(_) => {}
        _ => {
            if let Some(bits) = field.bit_len {
                if bits % 8 == 0 {
                    out.push(Directive::Bytes(bits / 8));
                } else {
                    out.push(Directive::Bits(bits));
                }
            }
        }
    }

    // 2. padding
    if let Some(pad) = field.pad_bits_before {
        out.push(Directive::PadBefore(pad));
    }

    // 3. byte order
    let big_endian = match field.ty {
        FieldType::Primitive(p) => p.is_big_endian(),
        FieldType::Variant(v) => module.variant(v).prim.is_big_endian(),
        _ => false,
    };
    if big_endian {
        out.push(Directive::BigEndian);
    }

    // 4. conditional presence
    if field.optional {
        out.push(Directive::PresentIfBytesRemain);
        if let FieldType::Variant(v) = field.ty {
            if let Some(first) = module.variant(v).cases.first() {
                out.push(Directive::DefaultCase {
                    variant: v,
                    case: first.name.clone(),
                });
            }
        }
    }

    // 5. context propagation
    if let Some(wrapper) = &field.wrapper {
        if let Some(tag) = wrapper.tag {
            out.push(Directive::TagMatch(tag));
        }
    }
    let needs_size = match field.ty {
        FieldType::Record(r) => module.record(r).needs_length_context(),
        // a wrapped buffer must know the declared total to compute what is left
        FieldType::Primitive(Primitive::Bytes) => field.wrapper.is_some(),
        _ => false,
    };
    if needs_size {
        out.push(Directive::NeedsSizeContext);
    }

    Ok(out)
}

/// Whether the record itself declares an incoming total-size context.
pub fn accepts_size_context(record: &RecordSchema) -> bool {
    record.needs_length_context()
}
