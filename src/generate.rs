//! End-to-end generation: resolve a set of message classes into modules,
//! route sample payloads to the class they decode as, project assertions and
//! write the generated source tree.

use std::collections::BTreeMap;
use std::path::Path;

use crate::assertions::project_assertions;
use crate::node::{Direction, Envelope, PayloadDecoder};
use crate::render::{render_index, render_module, TestCase};
use crate::resolve::{resolve_message, ModuleSchema};
use crate::schema::SchemaError;

fn unhex(s: &str) -> Result<Vec<u8>, SchemaError> {
    if s.len() % 2 != 0 {
        return Err(SchemaError::BadHex(s.to_string()));
    }
    (0..s.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| SchemaError::BadHex(s.to_string())))
        .collect()
}

/// Decode a payload trying the originated direction first, then terminated.
fn decode_either(decoder: &dyn PayloadDecoder, payload: &[u8]) -> Option<Envelope> {
    decoder
        .decode(payload, Direction::MobileOriginated)
        .or_else(|| decoder.decode(payload, Direction::MobileTerminated))
}

/// Resolve every class, attach each sample payload to the class it decodes
/// as, and write one generated module per class plus the `mod.rs` index under
/// `out_dir`.
pub fn generate_modules(
    out_dir: &Path,
    classes: &[Envelope],
    samples: &[String],
    decoder: &dyn PayloadDecoder,
) -> Result<(), SchemaError> {
    let mut modules: Vec<(ModuleSchema, Vec<TestCase>)> = Vec::new();
    let mut by_class_name: BTreeMap<String, usize> = BTreeMap::new();
    for class in classes {
        let mut module = resolve_message(class)?;
        // duplicate names must settle before projection so assertion paths
        // refer to the rendered field names
        for record in &mut module.records {
            record.fix_duplicate_names();
        }
        by_class_name.insert(class.name.clone(), modules.len());
        modules.push((module, Vec::new()));
    }

    for hex in samples {
        let payload = unhex(hex)?;
        let decoded = decode_either(decoder, &payload)
            .ok_or_else(|| SchemaError::AmbiguousMessageClass(hex.clone()))?;
        let &index = by_class_name
            .get(&decoded.name)
            .ok_or_else(|| SchemaError::UnknownClass(decoded.name.clone()))?;
        let (module, cases) = &mut modules[index];
        let assertions = project_assertions(module, &decoded)?;
        cases.push(TestCase {
            name: format!("case_{}", cases.len() + 1),
            hex: hex.clone(),
            assertions,
        });
    }

    std::fs::create_dir_all(out_dir)?;
    let names: Vec<String> = modules.iter().map(|(m, _)| m.name.clone()).collect();
    std::fs::write(out_dir.join("mod.rs"), render_index(&names))?;
    for (module, cases) in &mut modules {
        if !cases.is_empty() && cases.iter().all(|c| c.assertions.is_empty()) {
            eprintln!("warning: {} has test cases but no assertions", module.name);
        }
        let source = render_module(module, cases)?;
        std::fs::write(out_dir.join(format!("{}.rs", module.name)), source)?;
    }
    Ok(())
}

/// Reduce raw harvested payloads to the longest sample per message class.
/// Payloads that decode under neither direction are reported and dropped.
/// Output order follows class name, so repeated runs agree.
pub fn longest_per_class(samples: &[String], decoder: &dyn PayloadDecoder) -> Vec<String> {
    let mut longest: BTreeMap<String, String> = BTreeMap::new();
    for hex in samples {
        let Ok(payload) = unhex(hex) else {
            eprintln!("warning: skipping malformed hex payload {}", hex);
            continue;
        };
        let Some(decoded) = decode_either(decoder, &payload) else {
            eprintln!("warning: payload {} decodes under neither direction", hex);
            continue;
        };
        let entry = longest.entry(decoded.name).or_default();
        if entry.len() < hex.len() {
            *entry = hex.clone();
        }
    }
    longest.into_values().collect()
}
