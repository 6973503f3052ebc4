//! Assertion projection: walk a populated message tree in lock-step with its
//! resolved schema and emit one equality expectation per decoded field.
//!
//! The output drives generated regression tests. Fields with nothing to
//! compare are skipped: unit-typed fields, `spare*` names, fields without a
//! provenance index, and source values marked transparent (absent from the
//! payload).

use crate::node::{AtomValue, Envelope, Node};
use crate::resolve::ModuleSchema;
use crate::schema::{FieldType, Primitive, RecordId, SchemaError, VariantId};
use crate::wrapper::classify;

/// Expected right-hand side of one generated equality assertion.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpectedValue {
    Uint(u64),
    Bytes(Vec<u8>),
    /// Variant match: an exact declared case by value membership, or the
    /// catch-all when no case claims the decoded value.
    Case {
        variant: VariantId,
        case: Option<String>,
    },
}

/// One projected assertion: the field-name path from the module root and the
/// literal value decoded there.
#[derive(Debug, Clone, PartialEq)]
pub struct Assertion {
    pub path: Vec<String>,
    pub expected: ExpectedValue,
}

/// Project assertions for one decoded instance of the module's message.
///
/// Every top-level field that yields an assertion must be TLV-wrapped; an
/// unwrapped one is a caller error in this protocol family.
pub fn project_assertions(
    module: &ModuleSchema,
    decoded: &Envelope,
) -> Result<Vec<Assertion>, SchemaError> {
    let mut out = Vec::new();
    let mut path = Vec::new();
    project_record(module, module.root, decoded, &mut path, &mut out, true)?;
    Ok(out)
}

fn project_record(
    module: &ModuleSchema,
    record_id: RecordId,
    env: &Envelope,
    path: &mut Vec<String>,
    out: &mut Vec<Assertion>,
    at_root: bool,
) -> Result<(), SchemaError> {
    let record = module.record(record_id);
    for field in &record.fields {
        if matches!(field.ty, FieldType::Unit) || field.name.starts_with("spare") {
            continue;
        }
        let Some(index) = field.source_index else {
            continue;
        };
        let item = env.children.get(index).ok_or_else(|| {
            SchemaError::UnexpectedNode(format!(
                "decoded `{}` has no child at index {} for field `{}`",
                env.name, index, field.name
            ))
        })?;
        if item.is_transparent() {
            continue;
        }
        if at_root && field.wrapper.is_none() {
            return Err(SchemaError::UnwrappedRootField(field.name.clone()));
        }

        // unwrap a TLV container down to its value element
        let item = match item {
            Node::Envelope(e) => match classify(e)? {
                Some(wrapper) => {
                    let Some(slot) = wrapper.kind.inner_slot() else {
                        continue;
                    };
                    e.children.get(slot).ok_or_else(|| {
                        SchemaError::UnexpectedNode(format!(
                            "decoded wrapper `{}` is missing its value slot {}",
                            e.name, slot
                        ))
                    })?
                }
                None => item,
            },
            _ => item,
        };

        path.push(field.name.clone());
        match field.ty {
            FieldType::Primitive(prim) => {
                out.push(Assertion {
                    path: path.clone(),
                    expected: expect_literal(prim, item)?,
                });
            }
            FieldType::Variant(variant_id) => {
                let value = uint_value(item)?;
                let case = module
                    .variant(variant_id)
                    .case_for_value(value)
                    .map(|c| c.name.clone());
                out.push(Assertion {
                    path: path.clone(),
                    expected: ExpectedValue::Case {
                        variant: variant_id,
                        case,
                    },
                });
            }
            FieldType::Record(nested_id) => {
                let Node::Envelope(nested) = item else {
                    return Err(SchemaError::UnexpectedNode(format!(
                        "field `{}` is record-typed but its value is not an envelope",
                        field.name
                    )));
                };
                project_record(module, nested_id, nested, path, out, false)?;
            }
            FieldType::Unit => unreachable!("unit fields are skipped above"),
        }
        path.pop();
    }
    Ok(())
}

fn expect_literal(prim: Primitive, item: &Node) -> Result<ExpectedValue, SchemaError> {
    let Node::Atom(atom) = item else {
        return Err(SchemaError::UnexpectedNode(format!(
            "`{}` should be an atom",
            item.name()
        )));
    };
    match (&atom.value, prim) {
        (Some(AtomValue::Bytes(b)), Primitive::Bytes) => Ok(ExpectedValue::Bytes(b.clone())),
        (Some(AtomValue::Uint(v)), Primitive::U8 | Primitive::U16 | Primitive::U32) => {
            Ok(ExpectedValue::Uint(*v))
        }
        (None, _) => Err(SchemaError::MissingValue(atom.name.clone())),
        _ => Err(SchemaError::UnexpectedNode(format!(
            "`{}` holds a value of the wrong shape",
            atom.name
        ))),
    }
}

fn uint_value(item: &Node) -> Result<u64, SchemaError> {
    let Node::Atom(atom) = item else {
        return Err(SchemaError::UnexpectedNode(format!(
            "`{}` should be an atom",
            item.name()
        )));
    };
    match atom.value {
        Some(AtomValue::Uint(v)) => Ok(v),
        Some(AtomValue::Bytes(_)) => Err(SchemaError::UnexpectedNode(format!(
            "`{}` holds bytes where an integer was expected",
            atom.name
        ))),
        None => Err(SchemaError::MissingValue(atom.name.clone())),
    }
}
