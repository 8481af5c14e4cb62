//! Arena-backed event tree shared by the XML and JSON builders.
//!
//! Nodes live in a flat `Vec` and refer to each other by [`NodeId`]; the
//! parent link is a plain index, so the tree owns every node exactly once.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::schema::FieldSchema;

/// Namespace prefix (or JSON-LD context short name) to URI.
pub type Namespaces = BTreeMap<String, String>;

/// Names that never participate in field-path reconstruction.
pub const SYNTHETIC_NAMES: &[&str] = &["extension", "baseExtension"];

/// Field under which every descendant counts as standard.
pub const ILMD: &str = "ilmd";

/// Index of a node inside its [`EventTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Default)]
struct Node {
    name: Option<String>,
    value: Option<String>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

/// One event's fields as a tree.
///
/// The root is an unnamed node whose children are the event's top-level
/// fields. Unnamed nodes below the root are wrappers around one entry of a
/// list of objects.
#[derive(Debug, Clone)]
pub struct EventTree {
    nodes: Vec<Node>,
    namespaces: Arc<Namespaces>,
}

impl EventTree {
    /// Creates a tree holding only the root node.
    pub fn new(namespaces: Arc<Namespaces>) -> Self {
        Self {
            nodes: vec![Node::default()],
            namespaces,
        }
    }

    /// The unnamed event root.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn push(&mut self, parent: NodeId, name: Option<String>, value: Option<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name,
            value,
            children: Vec::new(),
            parent: Some(parent),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    /// Adds a named placeholder node awaiting children or a value.
    pub fn add_node(&mut self, parent: NodeId, name: impl Into<String>) -> NodeId {
        self.push(parent, Some(name.into()), None)
    }

    /// Adds a named leaf carrying a value.
    pub fn add_leaf(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> NodeId {
        self.push(parent, Some(name.into()), Some(value.into()))
    }

    /// Adds an unnamed wrapper hosting one list entry's fields.
    pub fn add_wrapper(&mut self, parent: NodeId) -> NodeId {
        self.push(parent, None, None)
    }

    /// Sets the leaf value of a node.
    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) {
        self.nodes[id.0].value = Some(value.into());
    }

    /// Field name, absent for the root and for list-entry wrappers.
    pub fn name(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].name.as_deref()
    }

    /// Leaf value, if any.
    pub fn value(&self, id: NodeId) -> Option<&str> {
        self.nodes[id.0].value.as_deref()
    }

    /// Children in insertion order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Whether the node has at least one child.
    pub fn has_children(&self, id: NodeId) -> bool {
        !self.nodes[id.0].children.is_empty()
    }

    /// Parent node, absent for the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when only the root exists.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1
    }

    /// Namespace table shared by every node of this tree.
    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    /// Replaces the namespace table.
    pub fn set_namespaces(&mut self, namespaces: Arc<Namespaces>) {
        self.namespaces = namespaces;
    }

    /// Ancestors from the parent up to (and including) the root.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(id), move |node| self.parent(*node))
    }

    fn is_path_segment(name: Option<&str>) -> bool {
        matches!(name, Some(n) if !SYNTHETIC_NAMES.contains(&n))
    }

    /// Field path from the event root down to `id`, skipping wrappers and
    /// synthetic names.
    pub fn field_path(&self, id: NodeId) -> Vec<&str> {
        let mut path: Vec<&str> = std::iter::once(id)
            .chain(self.ancestors(id))
            .map(|node| self.name(node))
            .filter(|name| Self::is_path_segment(*name))
            .flatten()
            .collect();
        path.reverse();
        path
    }

    /// Name of the closest named, non-synthetic ancestor.
    pub fn parent_field(&self, id: NodeId) -> Option<&str> {
        self.ancestors(id)
            .map(|node| self.name(node))
            .find(|name| Self::is_path_segment(*name))
            .flatten()
    }

    /// True when some ancestor is the `ilmd` field.
    pub fn is_under_ilmd(&self, id: NodeId) -> bool {
        self.ancestors(id).any(|node| self.name(node) == Some(ILMD))
    }

    /// Whether the node is a standard field: its path resolves in the catalog,
    /// or it lives under `ilmd`. Wrappers and synthetic nodes count as standard
    /// so they never get hoisted away from their contents.
    pub fn is_standard_field(&self, id: NodeId, schema: &FieldSchema) -> bool {
        if !Self::is_path_segment(self.name(id)) || self.is_under_ilmd(id) {
            return true;
        }
        schema.lookup(self.field_path(id)).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CbvVersion;

    fn sample() -> (EventTree, NodeId, NodeId, NodeId) {
        let mut tree = EventTree::new(Arc::new(Namespaces::new()));
        let root = tree.root();
        let list = tree.add_node(root, "bizTransactionList");
        let wrapper = tree.add_wrapper(list);
        let kind = tree.add_leaf(wrapper, "type", "po");
        let ilmd = tree.add_node(root, "ilmd");
        let lot = tree.add_leaf(ilmd, "example:lot", "A1");
        (tree, kind, lot, wrapper)
    }

    #[test]
    fn field_path_skips_wrappers() {
        let (tree, kind, _, _) = sample();
        assert_eq!(tree.field_path(kind), vec!["bizTransactionList", "type"]);
        assert_eq!(tree.parent_field(kind), Some("bizTransactionList"));
    }

    #[test]
    fn standard_classification() {
        let (mut tree, kind, lot, wrapper) = sample();
        let schema = FieldSchema::for_version(CbvVersion::V2_0);
        assert!(tree.is_standard_field(kind, schema));
        assert!(tree.is_standard_field(lot, schema));
        assert!(tree.is_standard_field(wrapper, schema));

        let ext = tree.add_leaf(tree.root(), "example:custom", "1");
        assert!(!tree.is_standard_field(ext, schema));
    }
}
