//! End-to-end resolution, directive and projection tests over hand-built
//! message class trees.

use tlvgen::{
    derive_field, project_assertions, resolve_message, Atom, AtomValue, Composite, Directive,
    Envelope, ExpectedValue, FieldType, Node, Primitive, SchemaError, TlvKind,
};

fn header() -> Node {
    Node::Envelope(Envelope::plain(
        "EMMHeader",
        vec![
            Node::Atom(Atom::uint("ProtDisc", 4)),
            Node::Atom(Atom::uint("SecHdr", 4)),
            Node::Atom(Atom::uint("Type", 8)),
        ],
    ))
}

fn tlv(name: &str, tag: u64, inner: Node) -> Node {
    Node::Envelope(Envelope::wrapped(
        name,
        "Type4TLV",
        vec![
            Node::Atom(Atom::uint("T", 8).with_uint(tag)),
            Node::Atom(Atom::uint("L", 8)),
            inner,
        ],
    ))
}

fn plmn() -> Envelope {
    Envelope::plain(
        "PLMN",
        vec![
            Node::Atom(Atom::uint("MCC", 12)),
            Node::Atom(Atom::uint("MNC", 12)),
        ],
    )
}

#[test]
fn repeated_shapes_resolve_to_one_record() {
    let class = Envelope::plain(
        "EMMAttachAccept",
        vec![
            header(),
            tlv("OldGUTI", 0x50, Node::Envelope(plmn())),
            tlv("NewGUTI", 0x51, Node::Envelope(plmn())),
        ],
    );
    let module = resolve_message(&class).unwrap();

    let root = module.root_record();
    assert_eq!(root.name, "EMMAttachAccept");
    assert_eq!(module.name, "emm_attach_accept");
    assert_eq!(root.fields.len(), 2);

    let FieldType::Record(a) = root.fields[0].ty else {
        panic!("old_guti should be record-typed");
    };
    let FieldType::Record(b) = root.fields[1].ty else {
        panic!("new_guti should be record-typed");
    };
    // same nested shape, same arena slot
    assert_eq!(a, b);
    assert_eq!(
        module.records.iter().filter(|r| r.name == "PLMN").count(),
        1
    );
}

#[test]
fn spare_padding_folds_into_the_next_field() {
    let class = Envelope::plain(
        "EMMDetachRequest",
        vec![
            header(),
            Node::Atom(Atom::uint("spare", 4)),
            Node::Envelope(Envelope::wrapped(
                "EMMCause",
                "Type3V",
                vec![Node::Atom(Atom::uint("V", 8))],
            )),
        ],
    );
    let module = resolve_message(&class).unwrap();
    let root = module.root_record();
    assert_eq!(root.fields.len(), 1);
    assert_eq!(root.fields[0].pad_bits_before, Some(4));

    let directives = derive_field(&module, &root.fields[0]).unwrap();
    assert_eq!(
        directives,
        vec![Directive::Bytes(1), Directive::PadBefore(4)]
    );
}

#[test]
fn sized_wrappers_suppress_the_declared_length() {
    let class = Envelope::plain(
        "EMMIdentityResponse",
        vec![
            header(),
            tlv("IDList", 0x17, Node::Atom(Atom::buf("V", 0))),
            Node::Envelope(Envelope::wrapped(
                "EMMCause",
                "Type3V",
                vec![Node::Atom(Atom::uint("V", 8))],
            )),
        ],
    );
    let module = resolve_message(&class).unwrap();
    let root = module.root_record();

    // length-prefixed wrapper implies the size
    assert_eq!(root.fields[0].bit_len, None);
    assert_eq!(root.fields[0].wrapper.unwrap().kind, TlvKind::Type4TLV);
    assert_eq!(root.fields[0].wrapper.unwrap().tag, Some(0x17));
    // fixed-length wrapper keeps the inner width
    assert_eq!(root.fields[1].bit_len, Some(8));

    // a wrapped buffer needs the caller's size to know what remains
    let directives = derive_field(&module, &root.fields[0]).unwrap();
    assert_eq!(
        directives,
        vec![Directive::TagMatch(0x17), Directive::NeedsSizeContext]
    );
}

#[test]
fn tag_only_indicator_becomes_a_unit_field() {
    let class = Envelope::plain(
        "EMMAttachRequest",
        vec![
            header(),
            Node::Envelope(Envelope::wrapped(
                "MSNetFeatSupp",
                "Type2",
                vec![Node::Atom(Atom::uint("T", 8).with_uint(0xC0))],
            )),
        ],
    );
    let module = resolve_message(&class).unwrap();
    let field = &module.root_record().fields[0];
    assert_eq!(field.ty, FieldType::Unit);
    assert_eq!(field.wrapper.unwrap().kind, TlvKind::Type2);
    assert_eq!(field.wrapper.unwrap().tag, Some(0xC0));
}

#[test]
fn unknown_wrapper_class_degrades_to_a_plain_field() {
    let class = Envelope::plain(
        "EMMAttachRequest",
        vec![
            header(),
            Node::Envelope(Envelope::plain(
                "NASKeySetId",
                vec![Node::Atom(Atom::uint("TSC", 1)), Node::Atom(Atom::uint("Value", 3))],
            )),
        ],
    );
    let module = resolve_message(&class).unwrap();
    let field = &module.root_record().fields[0];
    assert!(field.wrapper.is_none());
    assert!(matches!(field.ty, FieldType::Record(_)));
}

#[test]
fn variable_bitfield_fields_are_conditional_with_defaults() {
    let cap = Envelope::plain(
        "UENetCap",
        vec![
            Node::Atom(Atom::uint("EEA", 8)),
            Node::Atom(
                Atom::uint("UCS2", 1).with_dict(vec![(0, "default alphabet"), (1, "UCS2")]),
            ),
        ],
    );
    let class = Envelope::plain(
        "EMMAttachRequest",
        vec![header(), tlv("UENetCap", 0x58, Node::Envelope(cap))],
    );
    let module = resolve_message(&class).unwrap();

    let cap_record = module
        .records
        .iter()
        .find(|r| r.name == "UENetCap")
        .unwrap();
    assert!(cap_record.variable_bitfield);
    assert!(cap_record.needs_length_context());
    assert!(cap_record.fields.iter().all(|f| f.optional));

    let eea = &cap_record.fields[0];
    let directives = derive_field(&module, eea).unwrap();
    assert_eq!(
        directives,
        vec![Directive::Bytes(1), Directive::PresentIfBytesRemain]
    );

    // enumerated field additionally carries its first case as the default
    let ucs2 = &cap_record.fields[1];
    let directives = derive_field(&module, ucs2).unwrap();
    assert!(directives.contains(&Directive::PresentIfBytesRemain));
    assert!(directives.iter().any(|d| matches!(
        d,
        Directive::DefaultCase { case, .. } if case == "DefaultAlphabet"
    )));
}

#[test]
fn composite_inner_shapes_degrade_to_unit_fields() {
    let class = Envelope::plain(
        "EMMAttachRequest",
        vec![
            header(),
            tlv(
                "LCSClientId",
                0x33,
                Node::Composite(Composite {
                    name: "LCSClientId".to_string(),
                    transparent: false,
                }),
            ),
            Node::Envelope(Envelope::wrapped(
                "Container",
                "Type3V",
                vec![Node::Envelope(Envelope::plain(
                    "Inner",
                    vec![
                        Node::Atom(Atom::uint("Flag", 8)),
                        Node::Composite(Composite {
                            name: "List".to_string(),
                            transparent: false,
                        }),
                    ],
                ))],
            )),
        ],
    );
    let module = resolve_message(&class).unwrap();
    let root = module.root_record();

    // top-level: the wrapper stays, the value does not
    let lcs = &root.fields[0];
    assert_eq!(lcs.ty, FieldType::Unit);
    assert_eq!(lcs.source_index, None);
    assert_eq!(lcs.wrapper.unwrap().kind, TlvKind::Type4TLV);

    // nested: same degradation inside a resolved record
    let inner = module.records.iter().find(|r| r.name == "Inner").unwrap();
    assert_eq!(inner.fields[1].name, "list");
    assert_eq!(inner.fields[1].ty, FieldType::Unit);
    assert_eq!(inner.fields[1].source_index, None);

    // unit fields contribute nothing to projection
    let mut decoded = class.clone();
    if let Node::Envelope(container) = &mut decoded.children[2] {
        if let Node::Envelope(inner) = &mut container.children[0] {
            if let Node::Atom(flag) = &mut inner.children[0] {
                flag.value = Some(AtomValue::Uint(9));
            }
        }
    }
    let assertions = project_assertions(&module, &decoded).unwrap();
    assert_eq!(assertions.len(), 1);
    assert_eq!(assertions[0].path, vec!["container", "flag"]);
    assert_eq!(assertions[0].expected, ExpectedValue::Uint(9));
}

#[test]
fn repeated_dictionary_atoms_resolve_to_one_variant() {
    let cause = || {
        Node::Envelope(Envelope::wrapped(
            "EMMCause",
            "Type3V",
            vec![Node::Atom(
                Atom::uint("V", 8).with_dict(vec![(3, "Illegal UE"), (6, "Illegal ME")]),
            )],
        ))
    };
    let class = Envelope::plain("EMMStatus", vec![header(), cause(), cause()]);
    let module = resolve_message(&class).unwrap();

    assert_eq!(module.variants.len(), 1);
    let root = module.root_record();
    let FieldType::Variant(a) = root.fields[0].ty else {
        panic!("first cause should be variant-typed");
    };
    let FieldType::Variant(b) = root.fields[1].ty else {
        panic!("second cause should be variant-typed");
    };
    // same dictionary atom under the same prefix, same arena slot
    assert_eq!(a, b);
}

#[test]
fn nested_variants_are_scoped_by_their_owner() {
    let inner = Envelope::plain(
        "EPSAttachResult",
        vec![Node::Atom(
            Atom::uint("Value", 3).with_dict(vec![(1, "EPS only"), (2, "combined")]),
        )],
    );
    let class = Envelope::plain(
        "EMMAttachAccept",
        vec![header(), tlv("Result", 0x10, Node::Envelope(inner))],
    );
    let module = resolve_message(&class).unwrap();
    assert_eq!(module.variants.len(), 1);
    assert_eq!(module.variants[0].name, "EPSAttachResultValue");
    assert_eq!(module.variants[0].prim, Primitive::U8);
    assert_eq!(module.variants[0].bit_len, 3);
}

#[test]
fn top_level_enumerated_atom_is_scoped_by_its_element() {
    let class = Envelope::plain(
        "EMMDetachAccept",
        vec![
            header(),
            Node::Envelope(Envelope::wrapped(
                "EMMCause",
                "Type3V",
                vec![Node::Atom(
                    Atom::uint("V", 8).with_dict(vec![(3, "Illegal UE"), (6, "Illegal ME")]),
                )],
            )),
        ],
    );
    let module = resolve_message(&class).unwrap();
    assert_eq!(module.variants[0].name, "EMMCauseV");
    assert_eq!(module.variants[0].cases[0].name, "IllegalUE");
}

#[test]
fn wide_atoms_are_rejected() {
    let class = Envelope::plain(
        "EMMBad",
        vec![
            header(),
            Node::Envelope(Envelope::wrapped(
                "Wide",
                "Type3V",
                vec![Node::Atom(Atom::uint("V", 64))],
            )),
        ],
    );
    assert!(matches!(
        resolve_message(&class),
        Err(SchemaError::PrimitiveWidthOverflow { bits: 64, .. })
    ));
}

#[test]
fn missing_header_envelope_is_rejected() {
    let class = Envelope::plain("EMMBad", vec![Node::Atom(Atom::uint("Type", 8))]);
    assert!(matches!(
        resolve_message(&class),
        Err(SchemaError::UnexpectedNode(_))
    ));
}

#[test]
fn projection_walks_the_decoded_tree() {
    let class = Envelope::plain(
        "EMMAttachAccept",
        vec![
            header(),
            Node::Envelope(Envelope::wrapped(
                "EMMCause",
                "Type3V",
                vec![Node::Atom(
                    Atom::uint("V", 8).with_dict(vec![(3, "Illegal UE"), (6, "Illegal ME")]),
                )],
            )),
            tlv("GUTI", 0x50, Node::Envelope(plmn())),
        ],
    );
    let module = resolve_message(&class).unwrap();

    // a decoded instance of the same shape
    let decoded = Envelope::plain(
        "EMMAttachAccept",
        vec![
            header(),
            Node::Envelope(Envelope::wrapped(
                "EMMCause",
                "Type3V",
                vec![Node::Atom(
                    Atom::uint("V", 8)
                        .with_dict(vec![(3, "Illegal UE"), (6, "Illegal ME")])
                        .with_uint(6),
                )],
            )),
            tlv(
                "GUTI",
                0x50,
                Node::Envelope(Envelope::plain(
                    "PLMN",
                    vec![
                        Node::Atom(Atom::uint("MCC", 12).with_uint(208)),
                        Node::Atom(Atom::uint("MNC", 12).with_uint(15)),
                    ],
                )),
            ),
        ],
    );

    let assertions = project_assertions(&module, &decoded).unwrap();
    assert_eq!(assertions.len(), 3);
    assert_eq!(assertions[0].path, vec!["emm_cause"]);
    assert_eq!(
        assertions[0].expected,
        ExpectedValue::Case {
            variant: 0,
            case: Some("IllegalME".to_string())
        }
    );
    assert_eq!(assertions[1].path, vec!["guti", "mcc"]);
    assert_eq!(assertions[1].expected, ExpectedValue::Uint(208));
    assert_eq!(assertions[2].path, vec!["guti", "mnc"]);
    assert_eq!(assertions[2].expected, ExpectedValue::Uint(15));
}

#[test]
fn projection_flags_undeclared_enum_values_as_catch_all() {
    let class = Envelope::plain(
        "EMMDetachAccept",
        vec![
            header(),
            Node::Envelope(Envelope::wrapped(
                "EMMCause",
                "Type3V",
                vec![Node::Atom(
                    Atom::uint("V", 8).with_dict(vec![(3, "Illegal UE")]),
                )],
            )),
        ],
    );
    let module = resolve_message(&class).unwrap();

    let mut decoded = class.clone();
    if let Node::Envelope(cause) = &mut decoded.children[1] {
        if let Node::Atom(v) = &mut cause.children[0] {
            v.value = Some(AtomValue::Uint(42));
        }
    }
    let assertions = project_assertions(&module, &decoded).unwrap();
    assert_eq!(
        assertions[0].expected,
        ExpectedValue::Case {
            variant: 0,
            case: None
        }
    );
}

#[test]
fn projection_skips_absent_elements() {
    let class = Envelope::plain(
        "EMMAttachAccept",
        vec![
            header(),
            Node::Envelope(Envelope::wrapped(
                "EMMCause",
                "Type3V",
                vec![Node::Atom(Atom::uint("V", 8))],
            )),
        ],
    );
    let module = resolve_message(&class).unwrap();

    let mut decoded = class.clone();
    if let Node::Envelope(cause) = &mut decoded.children[1] {
        cause.transparent = true;
    }
    let assertions = project_assertions(&module, &decoded).unwrap();
    assert!(assertions.is_empty());
}

#[test]
fn projection_rejects_unwrapped_root_fields() {
    // an unrecognized wrapper degrades at resolution, but projection holds
    // the root to the all-wrapped contract
    let class = Envelope::plain(
        "EMMAttachRequest",
        vec![
            header(),
            Node::Envelope(Envelope::plain(
                "NASKeySetId",
                vec![Node::Atom(Atom::uint("Value", 3))],
            )),
        ],
    );
    let module = resolve_message(&class).unwrap();
    assert!(matches!(
        project_assertions(&module, &class),
        Err(SchemaError::UnwrappedRootField(_))
    ));
}

#[test]
fn duplicate_fields_settle_before_projection() {
    let class = Envelope::plain(
        "EMMTAUAccept",
        vec![
            header(),
            tlv("TAI", 0x54, Node::Envelope(plmn())),
            tlv("TAI", 0x55, Node::Envelope(plmn())),
        ],
    );
    let mut module = resolve_message(&class).unwrap();
    for record in &mut module.records {
        record.fix_duplicate_names();
    }

    let mut decoded = class.clone();
    for child in &mut decoded.children[1..] {
        let Node::Envelope(wrapper) = child else { unreachable!() };
        let Node::Envelope(inner) = &mut wrapper.children[2] else { unreachable!() };
        for atom in &mut inner.children {
            if let Node::Atom(a) = atom {
                a.value = Some(AtomValue::Uint(1));
            }
        }
    }
    let assertions = project_assertions(&module, &decoded).unwrap();
    assert_eq!(assertions[0].path[0], "tai_1");
    assert_eq!(assertions[2].path[0], "tai_2");
}
