use std::sync::Arc;

use eventhash_canonical::{
    ni_identifier, CanonicalError, Canonicalizer, CbvVersion, DigestAlg, DigestResult, EventTree,
    HashConfig, HashOutput, Namespaces,
};
use proptest::prelude::*;

fn namespaces() -> Arc<Namespaces> {
    let mut ns = Namespaces::new();
    ns.insert("example".into(), "https://ns.example.com/epcis/".into());
    ns.insert("ext2".into(), "http://ns.example.com/other/".into());
    Arc::new(ns)
}

fn config(version: CbvVersion) -> HashConfig {
    HashConfig::builder().version(version).build().unwrap()
}

fn lines(tree: &EventTree, version: CbvVersion) -> Vec<String> {
    Canonicalizer::new(config(version))
        .canonicalize(tree)
        .unwrap()
        .lines()
        .to_vec()
}

/// ObjectEvent with a nested extension inside `bizLocation` and two
/// top-level extensions given out of order.
fn event_with_extensions() -> EventTree {
    let mut tree = EventTree::new(namespaces());
    let root = tree.root();
    tree.add_leaf(root, "example:zeta", "z");
    tree.add_leaf(root, "ext2:alpha", "a");
    let location = tree.add_node(root, "bizLocation");
    tree.add_leaf(location, "example:room", "12");
    tree.add_leaf(location, "id", "urn:epc:id:sgln:0614141.00777.0");
    tree.add_leaf(root, "action", "ADD");
    tree.add_leaf(root, "type", "ObjectEvent");
    tree.add_leaf(root, "eventTime", "2021-05-27T13:00:00Z");
    tree
}

#[test]
fn hoisted_extensions_follow_every_standard_field() {
    assert_eq!(
        lines(&event_with_extensions(), CbvVersion::V2_0),
        vec![
            "eventType=ObjectEvent",
            "eventTime=2021-05-27T13:00:00.000Z",
            "action=ADD",
            "bizLocation",
            "id=https://id.gs1.org/414/0614141007776",
            "{https://ns.example.com/epcis/}room=12",
            "{http://ns.example.com/other/}alpha=a",
            "{https://ns.example.com/epcis/}zeta=z",
        ]
    );
}

#[test]
fn placement_is_invisible_when_nested_extension_ends_the_standard_fields() {
    let tree = event_with_extensions();
    assert_eq!(lines(&tree, CbvVersion::V2_1), lines(&tree, CbvVersion::V2_0));
}

#[test]
fn versions_differ_when_extension_precedes_later_standard_fields() {
    let mut tree = EventTree::new(namespaces());
    let root = tree.root();
    tree.add_leaf(root, "type", "ObjectEvent");
    let read_point = tree.add_node(root, "readPoint");
    tree.add_leaf(read_point, "id", "urn:epc:id:sgln:0614141.00777.0");
    tree.add_leaf(read_point, "example:door", "north");
    tree.add_leaf(root, "disposition", "in_progress");
    tree.add_leaf(root, "bizStep", "receiving");
    let location = tree.add_node(root, "bizLocation");
    tree.add_leaf(location, "id", "urn:epc:id:sgln:0614141.00888.0");

    let door = "{https://ns.example.com/epcis/}door=north";
    let hoisted = lines(&tree, CbvVersion::V2_0);
    let inline = lines(&tree, CbvVersion::V2_1);
    assert_eq!(hoisted.last().map(String::as_str), Some(door));
    assert_eq!(inline[inline.iter().position(|l| l == "readPoint").unwrap() + 2], door);
    assert_eq!(
        inline.last().map(String::as_str),
        Some("id=https://id.gs1.org/414/0614141008889")
    );
    assert_ne!(hoisted, inline);
}

#[test]
fn wrapped_extensions_sort_after_standard_fields() {
    let mut tree = EventTree::new(namespaces());
    let root = tree.root();
    let wrapper = tree.add_wrapper(root);
    tree.add_leaf(wrapper, "example:matrix", "a");
    let nested = tree.add_wrapper(wrapper);
    tree.add_leaf(nested, "example:matrix", "b");
    tree.add_leaf(root, "type", "ObjectEvent");
    tree.add_leaf(root, "action", "ADD");

    let expected = vec![
        "eventType=ObjectEvent",
        "action=ADD",
        "{https://ns.example.com/epcis/}matrix=a",
        "{https://ns.example.com/epcis/}matrix=b",
    ];
    assert_eq!(lines(&tree, CbvVersion::V2_1), expected);
    assert_eq!(lines(&tree, CbvVersion::V2_0), expected);
}

#[test]
fn equal_positions_tie_break_on_serialized_children() {
    let mut tree = EventTree::new(Arc::new(Namespaces::new()));
    let root = tree.root();
    let list = tree.add_node(root, "quantityList");
    let entries = [
        ("urn:epc:class:lgtin:4012345.012345.B", "5"),
        ("urn:epc:class:lgtin:4012345.012345.A", "7"),
    ];
    for (class, quantity) in entries {
        let element = tree.add_node(list, "quantityElement");
        tree.add_leaf(element, "quantity", quantity);
        tree.add_leaf(element, "epcClass", class);
    }
    assert_eq!(
        lines(&tree, CbvVersion::V2_0),
        vec![
            "quantityList",
            "quantityElement",
            "epcClass=https://id.gs1.org/01/04012345123456/10/A",
            "quantity=7",
            "quantityElement",
            "epcClass=https://id.gs1.org/01/04012345123456/10/B",
            "quantity=5",
        ]
    );
}

#[test]
fn ilmd_children_sort_by_display_string() {
    let mut tree = EventTree::new(namespaces());
    let root = tree.root();
    let ilmd = tree.add_node(root, "ilmd");
    tree.add_leaf(ilmd, "example:lot", "L1");
    tree.add_leaf(ilmd, "example:bestBefore", "2022-01-01");
    tree.add_leaf(root, "action", "ADD");
    assert_eq!(
        lines(&tree, CbvVersion::V2_0),
        vec![
            "action=ADD",
            "ilmd",
            "{https://ns.example.com/epcis/}bestBefore=2022-01-01",
            "{https://ns.example.com/epcis/}lot=L1",
        ]
    );
}

#[test]
fn nested_extension_subtrees_render_qualified_headers() {
    let mut tree = EventTree::new(namespaces());
    let root = tree.root();
    let outer = tree.add_node(root, "example:outer");
    tree.add_leaf(outer, "example:b", "2");
    tree.add_leaf(outer, "example:a", "1");
    tree.add_leaf(root, "action", "OBSERVE");
    assert_eq!(
        lines(&tree, CbvVersion::V2_1),
        vec![
            "action=OBSERVE",
            "{https://ns.example.com/epcis/}outer",
            "{https://ns.example.com/epcis/}a=1",
            "{https://ns.example.com/epcis/}b=2",
        ]
    );
}

#[test]
fn excluded_fields_emit_nothing() {
    let mut tree = EventTree::new(Arc::new(Namespaces::new()));
    let root = tree.root();
    tree.add_leaf(root, "action", "ADD");
    tree.add_leaf(root, "recordTime", "2021-05-27T13:00:00Z");
    tree.add_leaf(root, "eventID", "ni:///sha-256;00?ver=CBV2.0");
    let declaration = tree.add_node(root, "errorDeclaration");
    tree.add_leaf(declaration, "reason", "incorrect_data");
    assert_eq!(lines(&tree, CbvVersion::V2_0), vec!["action=ADD"]);

    let everything = HashConfig::builder().clear_excluded_fields().build().unwrap();
    let form = Canonicalizer::new(everything).canonicalize(&tree).unwrap();
    assert_eq!(
        form.lines(),
        [
            "action=ADD",
            "errorDeclaration",
            "reason=https://ref.gs1.org/cbv/ER-incorrect_data",
            "recordTime=2021-05-27T13:00:00.000Z",
            "eventID=ni:///sha-256;00?ver=CBV2.0",
        ]
    );
}

#[test]
fn embedded_newlines_are_stripped() {
    let mut tree = EventTree::new(namespaces());
    let root = tree.root();
    tree.add_leaf(root, "example:note", "two\nlines\r\n");
    let form = Canonicalizer::new(HashConfig::default()).canonicalize(&tree).unwrap();
    assert_eq!(form.lines(), ["{https://ns.example.com/epcis/}note=twolines"]);
}

#[test]
fn invalid_timestamps_are_errors() {
    let mut tree = EventTree::new(Arc::new(Namespaces::new()));
    let root = tree.root();
    tree.add_leaf(root, "eventTime", "27/05/2021");
    let err = Canonicalizer::new(HashConfig::default())
        .canonicalize(&tree)
        .unwrap_err();
    assert!(matches!(
        err,
        CanonicalError::InvalidTimestamp { ref field, .. } if field == "eventTime"
    ));
}

#[test]
fn digest_result_serializes_in_request_order() {
    let mut tree = EventTree::new(Arc::new(Namespaces::new()));
    let root = tree.root();
    tree.add_leaf(root, "action", "ADD");
    let config = HashConfig::builder()
        .outputs(["sha-256", "prehash", "MD5"])
        .build()
        .unwrap();
    let form = Canonicalizer::new(config.clone()).canonicalize(&tree).unwrap();
    let result = DigestResult::from_form(&form, config.outputs(), config.join(), config.version());

    let json = serde_json::to_string(&result).unwrap();
    let sha = ni_identifier(DigestAlg::Sha256, "action=ADD", CbvVersion::V2_0);
    let md5 = ni_identifier(DigestAlg::Md5, "action=ADD", CbvVersion::V2_0);
    assert_eq!(
        json,
        format!(r#"{{"sha-256":"{sha}","prehash":"action=ADD","MD5":"{md5}"}}"#)
    );
    assert!(md5.starts_with("ni:///md5;"));
}

#[test]
fn unknown_algorithms_resolve_to_sha256() {
    match HashOutput::parse("whirlpool") {
        HashOutput::Digest { requested, alg } => {
            assert_eq!(requested, "whirlpool");
            assert_eq!(alg, DigestAlg::Sha256);
        }
        HashOutput::PreHash => panic!("parsed as prehash"),
    }
}

fn arbitrary_tree(fields: &[(String, String)]) -> EventTree {
    let mut tree = EventTree::new(namespaces());
    let root = tree.root();
    tree.add_leaf(root, "type", "ObjectEvent");
    let list = tree.add_node(root, "epcList");
    for (name, value) in fields {
        tree.add_leaf(root, format!("example:{name}"), value.as_str());
        tree.add_leaf(list, "epc", format!("urn:epc:id:sgtin:0614141.107346.{value}"));
    }
    tree
}

proptest! {
    #[test]
    fn canonicalization_is_deterministic(
        fields in prop::collection::vec(("[a-z]{1,8}", "[0-9A-Z]{0,12}"), 0..12),
        alg in prop::sample::select(DigestAlg::ALL.to_vec()),
    ) {
        let tree = arbitrary_tree(&fields);
        let canonicalizer = Canonicalizer::new(HashConfig::default());
        let first = canonicalizer.canonicalize(&tree).unwrap();
        let second = canonicalizer.canonicalize(&tree.clone()).unwrap();
        prop_assert_eq!(&first, &second);

        let id1 = ni_identifier(alg, &first.digest_input(), CbvVersion::V2_0);
        let id2 = ni_identifier(alg, &second.digest_input(), CbvVersion::V2_0);
        prop_assert_eq!(id1, id2);
    }
}
