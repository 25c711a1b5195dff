//! Invariant tests for the harness pipeline: reference resolution,
//! BOM aggregation, derived-value caching, and output emission.

use std::fs;

use wireloom::{
    Cable, CableCategory, Connector, Harness, HarnessDocument, HarnessError, Metadata, MultiColor,
    OutputFormat, PinId, RenderOptions, Side, Tweak,
};

fn labeled_connector(name: &str) -> Connector {
    let mut connector = Connector::new(name, vec![1.into(), 2.into(), 3.into()]);
    connector.pinlabels = vec!["A".to_string(), "B".to_string(), "C".to_string()];
    connector
}

fn red_blue_cable(name: &str) -> Cable {
    Cable::new(name, vec![MultiColor::parse("RD"), MultiColor::parse("BU")])
}

fn sample_harness() -> Harness {
    let mut harness = Harness::new(
        Metadata::default(),
        RenderOptions::default(),
        Tweak::default(),
    );
    harness.add_connector(labeled_connector("X1")).unwrap();
    harness.add_connector(labeled_connector("X2")).unwrap();
    harness.add_cable(red_blue_cable("W1")).unwrap();
    harness
}

#[test]
fn invariant_pin_activation_is_idempotent() {
    let mut connector = labeled_connector("X1");
    connector.activate_pin(&2.into(), Side::Right).unwrap();
    let once = connector.active_sides(&2.into()).unwrap();
    connector.activate_pin(&2.into(), Side::Right).unwrap();
    assert_eq!(connector.active_sides(&2.into()).unwrap(), once);
}

#[test]
fn invariant_label_reference_resolves_and_activates() {
    // connector X1 with pins [1,2,3] and labels [A,B,C]: connecting
    // X1:"B" to wire 1 resolves to raw pin 2, active on the outbound side
    let mut harness = sample_harness();
    harness
        .connect(Some(("X1", "B".into())), "W1", 1.into(), None)
        .unwrap();

    let connection = &harness.cable("W1").unwrap().connections()[0];
    assert_eq!(connection.from.as_ref().unwrap().pin, PinId::from(2));
    assert_eq!(connection.wire, 1);

    let sides = harness
        .connector("X1")
        .unwrap()
        .active_sides(&2.into())
        .unwrap();
    assert!(sides.right);
    assert!(!sides.left);
}

#[test]
fn invariant_same_position_reference_succeeds() {
    let mut harness = sample_harness();
    let mut connector = Connector::new("X3", vec!["A".into(), "B".into()]);
    connector.pinlabels = vec!["A".to_string(), "B".to_string()];
    harness.add_connector(connector).unwrap();

    harness
        .connect(Some(("X3", "B".into())), "W1", 2.into(), None)
        .unwrap();
    let connection = &harness.cable("W1").unwrap().connections()[0];
    assert_eq!(connection.from.as_ref().unwrap().pin, PinId::from("B"));
}

#[test]
fn invariant_cross_position_reference_is_ambiguous() {
    let mut harness = sample_harness();
    let mut connector = Connector::new("X3", vec!["A".into(), "B".into()]);
    connector.pinlabels = vec!["B".to_string(), "A".to_string()];
    harness.add_connector(connector).unwrap();

    let result = harness.connect(Some(("X3", "A".into())), "W1", 1.into(), None);
    assert!(matches!(
        result,
        Err(HarnessError::AmbiguousPinReference { .. })
    ));
    let message = result.unwrap_err().to_string();
    assert!(message.contains("X3"));
    assert!(message.contains('A'));
}

#[test]
fn invariant_duplicate_wire_references_are_rejected() {
    let mut harness = sample_harness();
    let mut cable = Cable::new("W2", vec![MultiColor::parse("RD"), MultiColor::parse("RD")]);
    cable.wirelabels = vec!["SIG".to_string(), "SIG".to_string()];
    harness.add_cable(cable).unwrap();

    assert!(matches!(
        harness.connect(Some(("X1", 1.into())), "W2", "RD".into(), None),
        Err(HarnessError::DuplicateWireReference { .. })
    ));
    assert!(matches!(
        harness.connect(Some(("X1", 1.into())), "W2", "SIG".into(), None),
        Err(HarnessError::DuplicateWireReference { .. })
    ));
}

#[test]
fn invariant_identical_cables_share_a_bom_row() {
    let mut harness = sample_harness();
    let mut first = red_blue_cable("W2");
    first.ctype = Some("Data cable".to_string());
    first.length = Some(2.0);
    let mut second = red_blue_cable("W3");
    second.ctype = Some("Data cable".to_string());
    second.length = Some(2.0);
    harness.add_cable(first).unwrap();
    harness.add_cable(second).unwrap();

    let entries: Vec<_> = harness
        .bom()
        .iter()
        .filter(|entry| entry.key.description.starts_with("Cable, Data cable"))
        .cloned()
        .collect();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].qty, 2.0);
    assert_eq!(entries[0].designators, ["W2", "W3"]);
}

#[test]
fn invariant_bundle_wires_aggregate_by_color() {
    let mut harness = sample_harness();
    let mut bundle = Cable::new(
        "W2",
        vec![
            MultiColor::parse("RD"),
            MultiColor::parse("RD"),
            MultiColor::parse("BU"),
        ],
    );
    bundle.category = CableCategory::Bundle;
    bundle.length = Some(1.5);
    harness.add_cable(bundle).unwrap();

    let wires: Vec<_> = harness
        .bom()
        .iter()
        .filter(|entry| entry.key.description.starts_with("Wire"))
        .cloned()
        .collect();
    assert_eq!(wires.len(), 2);
    let red = wires
        .iter()
        .find(|entry| entry.key.description.ends_with("RD"))
        .unwrap();
    assert_eq!(red.qty, 3.0);
    assert_eq!(red.key.unit.as_deref(), Some("m"));
}

#[test]
fn invariant_mutation_invalidates_derived_values() {
    let mut harness = sample_harness();
    let rows_before = harness.bom().len();
    let nodes_before = harness.graph().unwrap().nodes.len();

    harness
        .add_connector(Connector::new("X9", vec![1.into()]))
        .unwrap();

    assert_eq!(harness.bom().len(), rows_before + 1);
    assert_eq!(harness.graph().unwrap().nodes.len(), nodes_before + 1);
}

#[test]
fn invariant_repeated_queries_reuse_the_memo() {
    let mut harness = sample_harness();
    harness
        .connect(Some(("X1", 1.into())), "W1", 1.into(), Some(("X2", 1.into())))
        .unwrap();
    let first = harness.to_dot().unwrap();
    let second = harness.to_dot().unwrap();
    assert_eq!(first, second);
}

#[test]
fn invariant_dot_output_names_every_component() {
    let mut harness = sample_harness();
    harness
        .connect(Some(("X1", "A".into())), "W1", 1.into(), Some(("X2", "C".into())))
        .unwrap();
    let dot = harness.to_dot().unwrap();
    assert!(dot.starts_with("graph {"));
    for id in ["\"X1\"", "\"X2\"", "\"W1\""] {
        assert!(dot.contains(id), "missing {id} in dot output");
    }
    assert!(dot.contains("\"X1\":p1r -- \"W1\":w1l"));
    assert!(dot.contains("\"W1\":w1r -- \"X2\":p3l"));
}

#[test]
fn invariant_document_build_matches_programmatic_build() {
    let raw = r#"{
        "metadata": {"title": "Demo"},
        "connectors": [
            {"name": "X1", "pins": [1, 2, 3], "pinlabels": ["A", "B", "C"]},
            {"name": "X2", "pincount": 2}
        ],
        "cables": [
            {"name": "W1", "colors": ["RD", "GYPK"]}
        ],
        "connections": [
            {"from": "X1", "from_pin": "B", "via": "W1", "wire": "GYPK", "to": "X2", "to_pin": 1}
        ],
        "additional_bom_items": [
            {"description": "Heat shrink", "qty": 2, "designators": ["W1"]}
        ]
    }"#;
    let mut harness = HarnessDocument::from_json(raw).unwrap().build().unwrap();

    let connection = &harness.cable("W1").unwrap().connections()[0];
    assert_eq!(connection.from.as_ref().unwrap().pin, PinId::from(2));
    assert_eq!(connection.wire, 2);

    // the striped wire pads every edge to three stripes
    let graph = harness.graph().unwrap();
    let edge = graph
        .edges
        .iter()
        .find(|edge| edge.from.node == "X1")
        .unwrap();
    assert_eq!(edge.color, "#999999:#ff66cc:#999999");

    assert!(harness
        .bom()
        .iter()
        .any(|entry| entry.key.description == "Heat shrink"));
}

#[test]
fn invariant_fingerprint_is_key_order_independent() {
    let a = r#"{"metadata": {"title": "T"}, "connectors": []}"#;
    let b = r#"{"connectors": [], "metadata": {"title": "T"}}"#;
    assert_eq!(
        wireloom::document_fingerprint(a).unwrap(),
        wireloom::document_fingerprint(b).unwrap()
    );
}

#[test]
fn invariant_outputs_land_next_to_the_base_path() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("demo");

    let mut harness = sample_harness();
    harness
        .connect(Some(("X1", 1.into())), "W1", 1.into(), Some(("X2", 1.into())))
        .unwrap();
    wireloom::report::write_outputs(
        &mut harness,
        &base,
        &[OutputFormat::Gv, OutputFormat::Tsv, OutputFormat::Html],
        Some("abc123"),
    )
    .unwrap();

    let dot = fs::read_to_string(dir.path().join("demo.gv")).unwrap();
    assert!(dot.contains("\"W1\""));

    let tsv = fs::read_to_string(dir.path().join("demo.bom.tsv")).unwrap();
    assert!(tsv.starts_with("#\tDescription\tQty"));
    assert_eq!(tsv.lines().count(), 1 + harness.bom().len());

    let html = fs::read_to_string(dir.path().join("demo.html")).unwrap();
    assert!(html.contains("Bill of Materials"));
    assert!(html.contains("abc123"));
}

#[test]
fn invariant_failed_connect_reports_the_offender() {
    let mut harness = sample_harness();
    let error = harness
        .connect(Some(("X1", 9.into())), "W1", 1.into(), None)
        .unwrap_err();
    assert_eq!(error.to_string(), "X1:9 not found");

    let error = harness
        .connect(Some(("X1", 1.into())), "W9", 1.into(), None)
        .unwrap_err();
    assert_eq!(error.to_string(), "cable W9 not found");
}
