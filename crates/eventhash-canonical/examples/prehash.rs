use std::sync::Arc;

use eventhash_canonical::{Canonicalizer, DigestResult, EventTree, HashConfig, Namespaces};

fn main() {
    let config = match HashConfig::builder()
        .join_with("\n")
        .outputs(["prehash", "sha-256"])
        .build()
    {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {}", err);
            std::process::exit(1);
        }
    };

    let mut namespaces = Namespaces::new();
    namespaces.insert("example".into(), "https://ns.example.com/epcis/".into());
    let mut tree = EventTree::new(Arc::new(namespaces));
    let root = tree.root();
    tree.add_leaf(root, "type", "ObjectEvent");
    tree.add_leaf(root, "example:lot", "A1");
    tree.add_leaf(root, "action", "OBSERVE");
    tree.add_leaf(root, "eventTime", "2025-12-20T00:00:00Z");
    let epcs = tree.add_node(root, "epcList");
    tree.add_leaf(epcs, "epc", "urn:epc:id:sgtin:0614141.107346.2017");

    match Canonicalizer::new(config.clone()).canonicalize(&tree) {
        Ok(form) => {
            let result =
                DigestResult::from_form(&form, config.outputs(), config.join(), config.version());
            for (output, value) in result.iter() {
                println!("{output}:\n{value}\n");
            }
        }
        Err(err) => {
            eprintln!("canonicalization failed: {}", err);
            std::process::exit(1);
        }
    }
}
