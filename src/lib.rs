//! # tlvgen — schema generation for TLV signalling messages
//!
//! Consumes decoded message trees (envelopes of TLV-wrapped atoms, nested
//! envelopes and value dictionaries) and produces deduplicated record and
//! variant schemas with bit-precise codec directives, rendered as declarative
//! Rust source for the deku codec framework.
//!
//! ## Pipeline
//!
//! - **Resolution** ([`resolve_message`]): one pass over a message class tree,
//!   caching records by node name and variants by scoped name, worklist-driven
//!   for nested shapes.
//! - **Directives** ([`derive_field`]): per-field codec rules in a fixed
//!   order (size, padding, endianness, presence, context).
//! - **Rendering** ([`render_module`]): records as deku structs, variants as
//!   deku enums with an exhaustive catch-all arm, plus a generated test
//!   section.
//! - **Assertions** ([`project_assertions`]): walk a populated tree in
//!   lock-step with its schema and emit one equality expectation per field.
//! - **Harvesting** ([`harvest_dir`]): pull sample payloads out of GSMTAP
//!   packet captures to seed the generated tests.
//!
//! ## Usage
//!
//! Build [`Envelope`] trees (or decode them with a [`PayloadDecoder`]), then
//! call [`generate_modules`] with an output directory, the message classes
//! and the harvested samples. See `tests/generate.rs` for a full example.

pub mod assertions;
pub mod bitrange;
pub mod directive;
pub mod generate;
pub mod harvest;
pub mod ident;
pub mod node;
pub mod render;
pub mod resolve;
pub mod schema;
pub mod wrapper;

pub use assertions::{project_assertions, Assertion, ExpectedValue};
pub use bitrange::BitRange;
pub use directive::{accepts_size_context, derive_field, Directive};
pub use generate::{generate_modules, longest_per_class};
pub use harvest::{harvest_dir, harvest_file, HarvestError};
pub use ident::{snake_case, upper_camel_case};
pub use node::{Atom, AtomValue, Composite, Direction, Envelope, Node, PayloadDecoder};
pub use render::{render_index, render_module, TestCase};
pub use resolve::{resolve_message, ModuleSchema};
pub use schema::{
    FieldDescriptor, FieldType, Primitive, RecordId, RecordSchema, SchemaError, VariantCase,
    VariantId, VariantSchema,
};
pub use wrapper::{classify, TlvKind, TlvWrapper};
