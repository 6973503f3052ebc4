//! Schema resolution: convert a decoded message tree into a module of record
//! and variant schemas.
//!
//! The resolver owns two name-keyed caches (records, variants) and a LIFO
//! worklist of records whose fields are still unresolved. Each distinct node
//! name resolves at most once; repeated or self-referential shapes hit the
//! cache and short-circuit, which is what bounds the algorithm.

use std::collections::HashMap;

use crate::ident::snake_case;
use crate::node::{Atom, Envelope, Node};
use crate::schema::{
    FieldDescriptor, FieldType, Primitive, RecordId, RecordSchema, SchemaError, VariantId,
    VariantSchema,
};
use crate::wrapper::classify;

/// The finished schema graph for one message class.
#[derive(Debug, Clone)]
pub struct ModuleSchema {
    /// snake_case module name, from the root record's label.
    pub name: String,
    pub records: Vec<RecordSchema>,
    pub variants: Vec<VariantSchema>,
    pub root: RecordId,
}

impl ModuleSchema {
    pub fn record(&self, id: RecordId) -> &RecordSchema {
        &self.records[id]
    }

    pub fn variant(&self, id: VariantId) -> &VariantSchema {
        &self.variants[id]
    }

    pub fn root_record(&self) -> &RecordSchema {
        &self.records[self.root]
    }
}

/// Resolve one message class. The root envelope's first child is the message
/// header and is skipped; every other child must be a TLV-wrapped element or
/// a bare `spare` padding atom.
pub fn resolve_message(root: &Envelope) -> Result<ModuleSchema, SchemaError> {
    let mut resolver = Resolver::default();
    let root_id = resolver.get_or_create_record(root, false);
    resolver.resolve_top_level(root_id, root)?;
    while let Some((id, env)) = resolver.pending.pop() {
        resolver.resolve_pending(id, env)?;
    }
    Ok(ModuleSchema {
        name: snake_case(&root.name),
        records: resolver.records,
        variants: resolver.variants,
        root: root_id,
    })
}

#[derive(Default)]
struct Resolver<'a> {
    records: Vec<RecordSchema>,
    record_ids: HashMap<String, RecordId>,
    variants: Vec<VariantSchema>,
    variant_ids: HashMap<String, VariantId>,
    /// Records created but not yet field-resolved, LIFO.
    pending: Vec<(RecordId, &'a Envelope)>,
}

impl<'a> Resolver<'a> {
    /// Cached record for this node name, creating (and, unless suppressed for
    /// the root, enqueueing) it on first sight.
    fn get_or_create_record(&mut self, env: &'a Envelope, enqueue: bool) -> RecordId {
        if let Some(&id) = self.record_ids.get(&env.name) {
            return id;
        }
        let id = self.records.len();
        self.records.push(RecordSchema::new(&env.name));
        self.record_ids.insert(env.name.clone(), id);
        if enqueue {
            self.pending.push((id, env));
        }
        id
    }

    /// Cached variant keyed by prefix + atom name.
    fn get_or_create_variant(&mut self, atom: &Atom, prefix: &str) -> Result<VariantId, SchemaError> {
        let key = format!("{}{}", prefix, atom.name);
        if let Some(&id) = self.variant_ids.get(&key) {
            return Ok(id);
        }
        let dict = atom
            .dict
            .as_deref()
            .ok_or_else(|| SchemaError::UnexpectedNode(format!("atom `{}` has no dictionary", atom.name)))?;
        let schema = VariantSchema::from_dict(prefix, &atom.name, atom.bit_len, dict)?;
        let id = self.variants.len();
        self.variants.push(schema);
        self.variant_ids.insert(key, id);
        Ok(id)
    }

    /// Top-level pass over a message envelope: skip the header, fold bare
    /// `spare` atoms into the next field's pad-before, classify each wrapper
    /// and type its inner value.
    fn resolve_top_level(&mut self, record_id: RecordId, root: &'a Envelope) -> Result<(), SchemaError> {
        let mut pad_bits: Option<u64> = None;

        for (i, child) in root.children.iter().enumerate() {
            if i == 0 {
                // the message header; its fields belong to the outer framing
                if !matches!(child, Node::Envelope(_)) {
                    return Err(SchemaError::UnexpectedNode(format!(
                        "message `{}` must start with a header envelope",
                        root.name
                    )));
                }
                continue;
            }

            let env = match child {
                Node::Envelope(e) => e,
                Node::Atom(a) if !a.buffer && a.name == "spare" => {
                    pad_bits = Some(a.bit_len);
                    continue;
                }
                other => {
                    return Err(SchemaError::UnexpectedNode(format!(
                        "top-level child `{}` is neither TLV-wrapped nor spare padding",
                        other.name()
                    )));
                }
            };

            let Some(wrapper) = classify(env)? else {
                // unrecognized wrapper kind: degrade to an unwrapped record field
                let mut field =
                    FieldDescriptor::new(&env.name, FieldType::Record(self.get_or_create_record(env, true)));
                field.pad_bits_before = pad_bits.take();
                field.source_index = Some(i);
                self.records[record_id].push_field(field);
                continue;
            };

            // the wrapper either declares a dedicated inner element or keeps
            // the value at its positional slot
            let inner: Option<&Node> = match env.ie.as_deref() {
                Some(n) => Some(n),
                None => match wrapper.kind.inner_slot() {
                    Some(slot) => Some(env.children.get(slot).ok_or_else(|| {
                        SchemaError::UnexpectedNode(format!(
                            "wrapper `{}` is missing its value slot {}",
                            env.name, slot
                        ))
                    })?),
                    None => None, // tag-only indicator
                },
            };

            let Some(inner) = inner else {
                let mut field = FieldDescriptor::new(&env.name, FieldType::Unit);
                field.wrapper = Some(wrapper);
                field.pad_bits_before = pad_bits.take();
                field.source_index = Some(i);
                self.records[record_id].push_field(field);
                continue;
            };

            let bit_len = if wrapper.kind.is_sized() {
                None
            } else {
                Some(inner.bit_len())
            };

            let (ty, source_index) = match inner {
                // list/sequence/array-like shapes have no schema counterpart;
                // the field degrades to unit with no provenance
                Node::Composite(_) => (FieldType::Unit, None),
                Node::Atom(a) if a.buffer => (FieldType::Primitive(Primitive::Bytes), Some(i)),
                Node::Atom(a) if a.dict.is_some() => {
                    (FieldType::Variant(self.get_or_create_variant(a, &env.name)?), Some(i))
                }
                Node::Atom(a) => (
                    FieldType::Primitive(Primitive::for_bit_len(&a.name, a.bit_len)?),
                    Some(i),
                ),
                Node::Envelope(e) => (FieldType::Record(self.get_or_create_record(e, true)), Some(i)),
            };

            let mut field = FieldDescriptor::new(&env.name, ty);
            field.wrapper = Some(wrapper);
            field.bit_len = bit_len;
            field.pad_bits_before = pad_bits.take();
            field.source_index = source_index;
            self.records[record_id].push_field(field);
        }
        Ok(())
    }

    /// Resolve the fields of one pending (nested) record. Nested children
    /// are never TLV-wrapped; a zero-length buffer is the record's trailing
    /// consume-the-rest field.
    fn resolve_pending(&mut self, record_id: RecordId, env: &'a Envelope) -> Result<(), SchemaError> {
        for (i, child) in env.children.iter().enumerate() {
            let mut bit_len = None;
            let mut final_buffer = false;
            let (ty, source_index) = match child {
                Node::Atom(a) if a.buffer => {
                    bit_len = Some(a.bit_len);
                    final_buffer = a.bit_len == 0;
                    (FieldType::Primitive(Primitive::Bytes), Some(i))
                }
                Node::Atom(a) if a.dict.is_some() => {
                    bit_len = Some(a.bit_len);
                    let prefix = self.records[record_id].name.clone();
                    (FieldType::Variant(self.get_or_create_variant(a, &prefix)?), Some(i))
                }
                Node::Atom(a) => {
                    bit_len = Some(a.bit_len);
                    (
                        FieldType::Primitive(Primitive::for_bit_len(&a.name, a.bit_len)?),
                        Some(i),
                    )
                }
                Node::Envelope(e) => (FieldType::Record(self.get_or_create_record(e, true)), Some(i)),
                Node::Composite(_) => (FieldType::Unit, None),
            };
            let mut field = FieldDescriptor::new(child.name(), ty);
            field.bit_len = bit_len;
            field.final_buffer = final_buffer;
            field.source_index = source_index;
            self.records[record_id].push_field(field);
        }
        Ok(())
    }
}
