//! Streaming XML event builder.
//!
//! Walks the element stream of an EPCIS XML document (quick-xml pull parser)
//! and yields one [`EventTree`] each time an event element closes. Namespace
//! declarations are global to the document: every `xmlns:` attribute seen so
//! far is visible to every event that closes after it.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::sync::Arc;

use eventhash_canonical::{
    is_event_type, EventTree, HashConfig, Namespaces, NodeId, IDENTIFIER_LISTS,
};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::debug;

use crate::errors::ReaderError;
use crate::json::WRAPPED_LISTS;

/// Namespaces whose prefixes are dropped from element names.
const STANDARD_NAMESPACES: &[&str] = &[
    "urn:epcglobal:epcis:xsd:1",
    "urn:epcglobal:epcis:xsd:2",
    "urn:epcglobal:epcis-query:xsd:1",
    "urn:epcglobal:epcis-query:xsd:2",
    "https://ref.gs1.org/standards/epcis",
    "http://www.unece.org/cefact/namespaces/StandardBusinessDocumentHeader",
];

const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Wrapper elements that add no field of their own.
const TRANSPARENT: &[&str] = &["extension", "baseExtension"];

/// Lists whose children are bare text values.
const VALUE_LISTS: &[&str] = &["correctiveEventIDs"];

/// What an open element turned into.
enum Open {
    /// The event element itself.
    Event,
    /// Named field node.
    Node(NodeId),
    /// Element with no node; children attach to `NodeId`.
    Transparent(NodeId),
    /// Entry of an identifier list; becomes a leaf when closed.
    ValueLeaf { parent: NodeId, name: String },
    /// Entry of a wrapped list; its text becomes a leaf of the wrapper.
    Entry { wrapper: NodeId, name: String },
}

struct Frame {
    open: Open,
    text: String,
}

/// Owned form of one parser event.
enum Step {
    Start {
        name: String,
        attributes: Vec<(String, String)>,
        empty: bool,
    },
    Text(String),
    End,
    Eof,
    Skip,
}

/// Iterator over the event trees of one XML document.
pub struct XmlEventReader<'c, R> {
    reader: Reader<R>,
    config: &'c HashConfig,
    namespaces: Namespaces,
    snapshot: Option<Arc<Namespaces>>,
    tree: Option<EventTree>,
    frames: Vec<Frame>,
    depth: usize,
    ignored: usize,
    finished: bool,
}

impl<'c, R: BufRead> XmlEventReader<'c, R> {
    /// Wraps a buffered source.
    pub fn new(source: R, config: &'c HashConfig) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(true);
        Self {
            reader,
            config,
            namespaces: BTreeMap::new(),
            snapshot: None,
            tree: None,
            frames: Vec::new(),
            depth: 0,
            ignored: 0,
            finished: false,
        }
    }

    /// Namespace declarations seen so far.
    pub fn namespaces(&self) -> &Namespaces {
        &self.namespaces
    }

    fn read_step(&mut self, buf: &mut Vec<u8>) -> Result<Step, ReaderError> {
        let position = self.reader.buffer_position() as u64;
        let xml_error = |source| ReaderError::Xml { position, source };
        let step = match self.reader.read_event_into(buf).map_err(xml_error)? {
            Event::Start(e) => Self::start_step(&e, false).map_err(xml_error)?,
            Event::Empty(e) => Self::start_step(&e, true).map_err(xml_error)?,
            Event::End(_) => Step::End,
            Event::Text(t) => Step::Text(t.unescape().map_err(xml_error)?.into_owned()),
            Event::CData(c) => Step::Text(String::from_utf8_lossy(&c).into_owned()),
            Event::DocType(_) => {
                return Err(ReaderError::XmlRejected(
                    "DOCTYPE declarations are not accepted".to_string(),
                ))
            }
            Event::Eof => Step::Eof,
            _ => Step::Skip,
        };
        Ok(step)
    }

    fn start_step(e: &BytesStart<'_>, empty: bool) -> Result<Step, quick_xml::Error> {
        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
        let mut attributes = Vec::new();
        for attribute in e.attributes() {
            let attribute = attribute?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            let value = attribute.unescape_value()?.into_owned();
            attributes.push((key, value));
        }
        Ok(Step::Start {
            name,
            attributes,
            empty,
        })
    }

    /// Records `xmlns:` declarations and returns the remaining attributes.
    fn declare_namespaces(&mut self, attributes: Vec<(String, String)>) -> Vec<(String, String)> {
        let mut rest = Vec::with_capacity(attributes.len());
        for (key, value) in attributes {
            if let Some(prefix) = key.strip_prefix("xmlns:") {
                self.namespaces.insert(prefix.to_string(), value);
                self.snapshot = None;
            } else if key != "xmlns" {
                rest.push((key, value));
            }
        }
        rest
    }

    /// Drops prefixes bound to standard namespaces.
    fn local_name(&self, name: &str) -> String {
        match name.split_once(':') {
            Some((prefix, local))
                if self
                    .namespaces
                    .get(prefix)
                    .is_some_and(|uri| STANDARD_NAMESPACES.contains(&uri.trim_end_matches('/'))) =>
            {
                local.to_string()
            }
            _ => name.to_string(),
        }
    }

    fn is_schema_instance(&self, name: &str) -> bool {
        name.split_once(':')
            .and_then(|(prefix, _)| self.namespaces.get(prefix))
            .is_some_and(|uri| uri == XSI_NAMESPACE)
    }

    fn target(&self, tree: &EventTree) -> NodeId {
        match self.frames.last().map(|f| &f.open) {
            Some(Open::Node(id)) | Some(Open::Transparent(id)) => *id,
            Some(Open::ValueLeaf { parent, .. }) => *parent,
            Some(Open::Entry { wrapper, .. }) => *wrapper,
            Some(Open::Event) | None => tree.root(),
        }
    }

    fn add_attributes(&self, tree: &mut EventTree, node: NodeId, attributes: &[(String, String)]) {
        for (key, value) in attributes {
            if self.is_schema_instance(key) {
                continue;
            }
            let name = self.local_name(key);
            if !self.config.is_excluded(&name) {
                tree.add_leaf(node, name, value.as_str());
            }
        }
    }

    fn open(&mut self, raw_name: String, attributes: Vec<(String, String)>) {
        let attributes = self.declare_namespaces(attributes);
        if self.ignored > 0 {
            self.ignored += 1;
            return;
        }
        let name = self.local_name(&raw_name);

        let Some(mut tree) = self.tree.take() else {
            if is_event_type(&name) {
                let mut tree = EventTree::new(Arc::default());
                let root = tree.root();
                tree.add_leaf(root, "type", name.as_str());
                self.tree = Some(tree);
                self.frames.push(Frame {
                    open: Open::Event,
                    text: String::new(),
                });
            }
            return;
        };

        if self.config.is_excluded(&name) {
            self.ignored = 1;
            self.tree = Some(tree);
            return;
        }

        let target = self.target(&tree);
        let parent_name = tree.name(target).unwrap_or_default().to_string();
        let open = if TRANSPARENT.contains(&name.as_str()) {
            Open::Transparent(target)
        } else if IDENTIFIER_LISTS.contains(&parent_name.as_str())
            || VALUE_LISTS.contains(&parent_name.as_str())
        {
            Open::ValueLeaf {
                parent: target,
                name,
            }
        } else if WRAPPED_LISTS.contains(&parent_name.as_str()) {
            let wrapper = tree.add_wrapper(target);
            self.add_attributes(&mut tree, wrapper, &attributes);
            Open::Entry { wrapper, name }
        } else {
            let node = tree.add_node(target, name);
            self.add_attributes(&mut tree, node, &attributes);
            Open::Node(node)
        };
        self.tree = Some(tree);
        self.frames.push(Frame {
            open,
            text: String::new(),
        });
    }

    fn text(&mut self, text: String) -> Result<(), ReaderError> {
        if self.depth == 0 {
            if text.trim().is_empty() {
                return Ok(());
            }
            return Err(ReaderError::XmlRejected(
                "text outside the document element".to_string(),
            ));
        }
        if self.ignored == 0 {
            if let Some(frame) = self.frames.last_mut() {
                frame.text.push_str(&text);
            }
        }
        Ok(())
    }

    /// Closes the innermost element; returns the finished tree when it was
    /// the event element.
    fn close(&mut self) -> Option<EventTree> {
        if self.ignored > 0 {
            self.ignored -= 1;
            return None;
        }
        let frame = self.frames.pop()?;
        let text = frame.text.trim().to_string();
        let tree = self.tree.as_mut()?;
        match frame.open {
            Open::Event => {
                let mut tree = self.tree.take()?;
                let namespaces = self
                    .snapshot
                    .get_or_insert_with(|| Arc::new(self.namespaces.clone()))
                    .clone();
                tree.set_namespaces(namespaces);
                debug!(nodes = tree.len(), "built event tree from XML");
                return Some(tree);
            }
            Open::Transparent(_) => {}
            Open::ValueLeaf { parent, name } => {
                tree.add_leaf(parent, name, text);
            }
            Open::Entry { wrapper, name } => {
                tree.add_leaf(wrapper, name, text);
            }
            Open::Node(id) => {
                if !text.is_empty() {
                    if tree.has_children(id) {
                        let name = tree.name(id).unwrap_or_default().to_string();
                        tree.add_leaf(id, name, text);
                    } else {
                        tree.set_value(id, text);
                    }
                }
            }
        }
        None
    }

    fn next_tree(&mut self) -> Result<Option<EventTree>, ReaderError> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match self.read_step(&mut buf)? {
                Step::Start {
                    name,
                    attributes,
                    empty,
                } => {
                    self.depth += 1;
                    self.open(name, attributes);
                    if empty {
                        self.depth -= 1;
                        if let Some(tree) = self.close() {
                            return Ok(Some(tree));
                        }
                    }
                }
                Step::End => {
                    self.depth = self.depth.saturating_sub(1);
                    if let Some(tree) = self.close() {
                        return Ok(Some(tree));
                    }
                }
                Step::Text(text) => self.text(text)?,
                Step::Eof => {
                    if self.depth > 0 || self.tree.is_some() {
                        return Err(ReaderError::XmlRejected(
                            "document ended inside an open element".to_string(),
                        ));
                    }
                    return Ok(None);
                }
                Step::Skip => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for XmlEventReader<'_, R> {
    type Item = Result<EventTree, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let result = self.next_tree();
        if !matches!(result, Ok(Some(_))) {
            self.finished = true;
        }
        result.transpose()
    }
}
