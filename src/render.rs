//! Render a resolved module as declarative Rust source for the deku codec
//! framework, plus the generated regression-test section.
//!
//! Derivation stays in `directive`; this module only maps the directive IR
//! onto deku attribute syntax, so the hard logic is testable without string
//! comparison.

use crate::assertions::{Assertion, ExpectedValue};
use crate::bitrange::BitRange;
use crate::directive::{accepts_size_context, derive_field, Directive};
use crate::resolve::ModuleSchema;
use crate::schema::{FieldDescriptor, FieldType, RecordSchema, SchemaError, VariantSchema};

/// One sample payload projected into assertions against the module root.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    /// Full payload hex, including the two header bytes the generated struct
    /// does not itself consume.
    pub hex: String,
    pub assertions: Vec<Assertion>,
}

fn indent(s: &str, levels: usize) -> String {
    let pad = "    ".repeat(levels);
    s.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("{}{}", pad, line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render one module: records, variants and (when any assertions exist) the
/// test section. Duplicate field names are resolved first; the pass is
/// idempotent, so callers that already ran it see no change.
pub fn render_module(module: &mut ModuleSchema, cases: &[TestCase]) -> Result<String, SchemaError> {
    for record in &mut module.records {
        record.fix_duplicate_names();
    }

    let mut blocks = Vec::new();
    // the two framing header types never belong to a generated module
    const EXCLUDED_RECORDS: &[&str] = &["EMMHeader", "ESMHeader"];
    for record in &module.records {
        if EXCLUDED_RECORDS.contains(&record.name.as_str()) {
            continue;
        }
        blocks.push(render_record(module, record)?);
    }
    for variant in &module.variants {
        blocks.push(render_variant(variant));
    }

    let tests = render_tests(module, cases)?;
    Ok(format!(
        "use deku::prelude::*;\nuse deku::ctx::ByteSize;\nuse serde::Serialize;\nuse crate::nas::layer3::*;\n\n{}\n{}",
        blocks.join("\n\n"),
        tests
    ))
}

/// The `mod.rs` index declaring every generated module.
pub fn render_index(module_names: &[String]) -> String {
    let decls = module_names
        .iter()
        .map(|name| format!("pub mod {};", name))
        .collect::<Vec<_>>()
        .join("\n");
    format!("#![allow(unused_imports)]\n\n{}\n", decls)
}

fn render_record(module: &ModuleSchema, record: &RecordSchema) -> Result<String, SchemaError> {
    let ctx_line = if accepts_size_context(record) {
        "\n#[deku(ctx = \"ByteSize(byte_size): ByteSize\")]"
    } else {
        ""
    };
    let mut fields = Vec::new();
    for field in &record.fields {
        fields.push(indent(&render_field(module, field)?, 1));
    }
    Ok(format!(
        "#[derive(DekuRead, Debug, Serialize, Clone)]{}\npub struct {} {{\n{}\n}}",
        ctx_line,
        record.name,
        fields.join("\n")
    ))
}

fn render_field(module: &ModuleSchema, field: &FieldDescriptor) -> Result<String, SchemaError> {
    let directives = derive_field(module, field)?;

    let mut attrs = Vec::new();
    let mut ctx = Vec::new();
    for directive in &directives {
        match directive {
            Directive::Bits(n) => attrs.push(format!("bits = {}", n)),
            Directive::Bytes(n) => attrs.push(format!("bytes = {}", n)),
            Directive::ByteCount(n) => attrs.push(format!("count = \"{}\"", n)),
            Directive::RemainingCount => {
                attrs.push("count = \"byte_size - deku::byte_offset\"".to_string())
            }
            Directive::PadBefore(n) => attrs.push(format!("pad_bits_before = \"{}\"", n)),
            Directive::BigEndian => attrs.push("endian = \"big\"".to_string()),
            Directive::PresentIfBytesRemain => {
                attrs.push("cond = \"deku::byte_offset < byte_size\"".to_string())
            }
            Directive::DefaultCase { variant, case } => attrs.push(format!(
                "default = \"{}::{}\"",
                module.variant(*variant).name,
                case
            )),
            Directive::TagMatch(tag) => ctx.push(format!("Tag({})", tag)),
            Directive::NeedsSizeContext => ctx.push("NeedsByteSize".to_string()),
        }
    }
    if !ctx.is_empty() {
        attrs.push(format!("ctx = \"{}\"", ctx.join(", ")));
    }

    let base = match field.ty {
        FieldType::Unit => "()".to_string(),
        FieldType::Primitive(p) => p.rust_type_name().to_string(),
        FieldType::Record(r) => module.record(r).name.clone(),
        FieldType::Variant(v) => module.variant(v).name.clone(),
    };
    let type_name = match &field.wrapper {
        Some(wrapper) => {
            let inner = if matches!(field.ty, FieldType::Primitive(crate::schema::Primitive::Bytes))
            {
                "Layer3Buffer".to_string()
            } else {
                base
            };
            format!("{}<{}>", wrapper.kind.class_name(), inner)
        }
        None => base,
    };

    let attr_part = if attrs.is_empty() {
        String::new()
    } else {
        format!("#[deku({})] ", attrs.join(", "))
    };
    Ok(format!("{}pub {}: {},", attr_part, field.name, type_name))
}

fn render_variant(variant: &VariantSchema) -> String {
    let mut attrs = vec![
        format!("id_type = \"{}\"", variant.prim.rust_type_name()),
        format!("bits = {}", variant.bit_len),
    ];
    if variant.prim.is_big_endian() {
        attrs.push("endian = \"big\"".to_string());
    }

    let mut arms = Vec::new();
    let mut remaining = BitRange::full(variant.bit_len.min(32) as u32);
    for case in &variant.cases {
        let pattern = case
            .values
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(" | ");
        arms.push(format!("#[deku(id_pat = \"{}\")] {},", pattern, case.name));
        for &value in &case.values {
            remaining.remove(value);
        }
    }
    // exhaustive catch-all over whatever the declared cases left unclaimed
    let other_pattern = if remaining.is_empty() {
        "_".to_string()
    } else {
        remaining.pattern()
    };
    arms.push(format!("#[deku(id_pat = \"{}\")] Other,", other_pattern));

    let arm_text = arms
        .iter()
        .map(|arm| indent(arm, 1))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "#[derive(DekuRead, Debug, Serialize, Clone, PartialEq)]\n#[deku({})]\npub enum {} {{\n{}\n}}",
        attrs.join(", "),
        variant.name,
        arm_text
    )
}

fn render_tests(module: &ModuleSchema, cases: &[TestCase]) -> Result<String, SchemaError> {
    let total: usize = cases.iter().map(|c| c.assertions.len()).sum();
    if total == 0 {
        return Ok(String::new());
    }
    let mut fns = Vec::new();
    for case in cases {
        fns.push(indent(&render_test_case(module, case)?, 1));
    }
    Ok(format!(
        "\n#[cfg(test)]\nmod tests {{\n    use super::*;\n    use crate::nas::test_utils::*;\n    use deku::prelude::*;\n    use std::io::Cursor;\n\n{}\n}}\n",
        fns.join("\n\n")
    ))
}

fn render_test_case(module: &ModuleSchema, case: &TestCase) -> Result<String, SchemaError> {
    // the two framing header bytes are consumed upstream of the struct
    let payload_hex = case.hex.get(4..).unwrap_or("");
    let mut lines = Vec::new();
    let mut unwrapped: Vec<&str> = Vec::new();
    for assertion in &case.assertions {
        let root_name = assertion.path.first().ok_or_else(|| {
            SchemaError::UnexpectedNode("assertion with an empty field path".to_string())
        })?;
        let root_field = module
            .root_record()
            .fields
            .iter()
            .find(|f| &f.name == root_name)
            .ok_or_else(|| SchemaError::UnwrappedRootField(root_name.clone()))?;
        let wrapper = root_field
            .wrapper
            .as_ref()
            .ok_or_else(|| SchemaError::UnwrappedRootField(root_name.clone()))?;

        // bind each top-level inner value once; tagged wrappers hold an
        // Option, so those bind a reference
        if !unwrapped.iter().any(|n| n == root_name) {
            let mut inner = format!("msg.{}.inner", root_name);
            if wrapper.kind.is_tagged() {
                inner.push_str(".as_ref().unwrap()");
            }
            lines.push(format!("let {} = {};", root_name, inner));
            unwrapped.push(root_name);
        }

        let lhs = assertion.path.join(".");
        lines.push(format!("assert_eq!({}, {});", lhs, render_expected(module, &assertion.expected)));
    }
    let body = indent(&lines.join("\n"), 1);
    Ok(format!(
        "#[test]\nfn test_{}() {{\n    let mut bytes = Cursor::new(unhexlify(\"{}\"));\n    let mut reader = Reader::new(&mut bytes);\n    let msg = {}::from_reader_with_ctx(&mut reader, ())\n        .expect(\"failed to parse\");\n{}\n}}",
        case.name,
        payload_hex,
        module.root_record().name,
        body
    ))
}

fn render_expected(module: &ModuleSchema, expected: &ExpectedValue) -> String {
    match expected {
        ExpectedValue::Uint(v) => v.to_string(),
        ExpectedValue::Bytes(bytes) => {
            let items = bytes
                .iter()
                .map(|b| b.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            format!("vec![{}]", items)
        }
        ExpectedValue::Case { variant, case } => {
            let name = module.variant(*variant).name.as_str();
            match case {
                Some(case_name) => format!("{}::{}", name, case_name),
                None => format!("{}::Other", name),
            }
        }
    }
}
