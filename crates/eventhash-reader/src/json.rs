//! JSON / JSON-LD event builder.
//!
//! Turns one parsed event object into an [`EventTree`] shaped like the tree
//! the XML builder produces for the same event.

use std::sync::Arc;

use eventhash_canonical::{EventTree, HashConfig, Namespaces, NodeId, IDENTIFIER_LISTS};
use serde_json::{Map, Value};

use crate::errors::ReaderError;

const QUANTITY_LISTS: &[&str] = &[
    "quantityList",
    "childQuantityList",
    "inputQuantityList",
    "outputQuantityList",
];

/// Lists whose entries become anonymous wrappers holding the entry's fields.
pub(crate) const WRAPPED_LISTS: &[&str] = &[
    "bizTransactionList",
    "sourceList",
    "destinationList",
];

/// Entry name used inside lists that XML spells with a repeated child element.
fn entry_name(list: &str) -> Option<&'static str> {
    if IDENTIFIER_LISTS.contains(&list) {
        Some("epc")
    } else if QUANTITY_LISTS.contains(&list) {
        Some("quantityElement")
    } else {
        match list {
            "sensorElementList" => Some("sensorElement"),
            "correctiveEventIDs" => Some("correctiveEventID"),
            _ => None,
        }
    }
}

/// Merges a JSON-LD `@context` (string, object or array of either) into a
/// namespace table. Remote context URLs carry no prefixes and are ignored.
pub fn merge_context(namespaces: &mut Namespaces, context: &Value) {
    match context {
        Value::Object(map) => {
            for (prefix, uri) in map {
                if let Value::String(uri) = uri {
                    namespaces.insert(prefix.clone(), uri.clone());
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                merge_context(namespaces, item);
            }
        }
        _ => {}
    }
}

/// Builds the tree of one event object.
///
/// `namespaces` is the document-level table; an event-level `@context` is
/// merged into a private copy.
pub fn build_event_tree(
    event: &Value,
    namespaces: Arc<Namespaces>,
    config: &HashConfig,
) -> Result<EventTree, ReaderError> {
    let Value::Object(fields) = event else {
        return Err(ReaderError::Shape(format!(
            "expected an event object, found {}",
            kind(event)
        )));
    };
    let namespaces = match fields.get("@context") {
        Some(context) => {
            let mut merged = (*namespaces).clone();
            merge_context(&mut merged, context);
            Arc::new(merged)
        }
        None => namespaces,
    };

    let mut tree = EventTree::new(namespaces);
    let root = tree.root();
    add_object(&mut tree, root, fields, config);
    Ok(tree)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn add_object(
    tree: &mut EventTree,
    parent: NodeId,
    fields: &Map<String, Value>,
    config: &HashConfig,
) {
    for (key, value) in fields {
        add_field(tree, parent, key, value, config);
    }
}

fn add_field(tree: &mut EventTree, parent: NodeId, key: &str, value: &Value, config: &HashConfig) {
    if config.is_excluded(key) {
        return;
    }
    match value {
        Value::Object(fields) => {
            let node = tree.add_node(parent, key);
            add_object(tree, node, fields, config);
        }
        Value::Array(items) => add_array(tree, parent, key, items, config),
        Value::Null => {
            tree.add_node(parent, key);
        }
        scalar => {
            if let Some(text) = scalar_text(scalar) {
                tree.add_leaf(parent, key, text);
            }
        }
    }
}

fn add_array(
    tree: &mut EventTree,
    parent: NodeId,
    key: &str,
    items: &[Value],
    config: &HashConfig,
) {
    if let Some(entry) = entry_name(key) {
        let list = tree.add_node(parent, key);
        for item in items {
            add_field(tree, list, entry, item, config);
        }
    } else if WRAPPED_LISTS.contains(&key) {
        let list = tree.add_node(parent, key);
        for item in items {
            match item {
                Value::Object(fields) => {
                    let wrapper = tree.add_wrapper(list);
                    add_object(tree, wrapper, fields, config);
                }
                other => add_field(tree, list, key, other, config),
            }
        }
    } else {
        // Repeated elements: each entry is a sibling named by the key.
        for item in items {
            match item {
                Value::Array(nested) => {
                    let wrapper = tree.add_wrapper(parent);
                    add_array(tree, wrapper, key, nested, config);
                }
                other => add_field(tree, parent, key, other, config),
            }
        }
    }
}
