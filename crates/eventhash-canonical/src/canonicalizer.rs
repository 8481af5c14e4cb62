use std::cmp::Ordering;
use std::fmt;

use tracing::debug;

use crate::config::{ExtensionPlacement, HashConfig};
use crate::errors::CanonicalError;
use crate::format::{extension_display, format_standard_leaf, qualified_name};
use crate::tree::{EventTree, NodeId, SYNTHETIC_NAMES};

/// Ordered pre-hash lines of one event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanonicalForm {
    lines: Vec<String>,
}

impl CanonicalForm {
    /// Lines in canonical order, newline characters already removed.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Lines joined with `join`, as returned for `prehash` outputs.
    pub fn joined(&self, join: &str) -> String {
        self.lines.join(join)
    }

    /// Bytes fed to digest algorithms: lines concatenated with no separator.
    pub fn digest_input(&self) -> String {
        self.lines.concat()
    }
}

impl fmt::Display for CanonicalForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.joined("\n"))
    }
}

/// Sort rank of one sibling.
#[derive(Debug)]
enum Rank {
    /// Catalogued field (or wrapper) at this sibling position.
    Standard(usize),
    /// Descendant of `ilmd`, ordered by display string.
    Ilmd(String),
    /// User extension, ordered by display string after every standard sibling.
    Extension(String),
}

#[derive(Debug, Default)]
struct Rendered {
    standard: Vec<String>,
    hoisted: Vec<String>,
}

struct Entry {
    rank: Rank,
    has_children: bool,
    serialized: String,
    rendered: Rendered,
}

impl Entry {
    fn tie_break(&self, other: &Self) -> Ordering {
        if self.has_children && other.has_children {
            self.serialized.cmp(&other.serialized)
        } else {
            Ordering::Equal
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (&self.rank, &other.rank) {
            (Rank::Extension(a), Rank::Extension(b)) | (Rank::Ilmd(a), Rank::Ilmd(b)) => {
                a.cmp(b).then_with(|| self.tie_break(other))
            }
            (Rank::Extension(_), _) => Ordering::Greater,
            (_, Rank::Extension(_)) => Ordering::Less,
            (Rank::Standard(a), Rank::Standard(b)) => a.cmp(b).then_with(|| self.tie_break(other)),
            (Rank::Standard(_), Rank::Ilmd(_)) | (Rank::Ilmd(_), Rank::Standard(_)) => {
                Ordering::Equal
            }
        }
    }
}

/// Name of a node unless it is a wrapper or a synthetic container.
fn field_name(tree: &EventTree, id: NodeId) -> Option<&str> {
    tree.name(id).filter(|name| !SYNTHETIC_NAMES.contains(name))
}

/// Sort key of an extension node; wrappers sort by their first rendered line.
fn extension_key(tree: &EventTree, id: NodeId, lines: &[String]) -> String {
    match field_name(tree, id) {
        Some(_) => extension_display(tree, id),
        None => lines.first().cloned().unwrap_or_default(),
    }
}

/// Turns event trees into canonical pre-hash lines.
pub struct Canonicalizer {
    config: HashConfig,
}

impl Canonicalizer {
    /// Creates a canonicalizer for the provided configuration.
    pub fn new(config: HashConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &HashConfig {
        &self.config
    }

    /// Produces the ordered pre-hash lines of an event tree.
    pub fn canonicalize(&self, tree: &EventTree) -> Result<CanonicalForm, CanonicalError> {
        let rendered = self.render_children(tree, tree.root())?;
        let lines: Vec<String> = rendered
            .standard
            .into_iter()
            .chain(rendered.hoisted)
            .map(|line| line.replace(['\n', '\r'], ""))
            .filter(|line| !line.is_empty())
            .collect();
        debug!(
            lines = lines.len(),
            version = self.config.version().tag(),
            "canonicalized event tree"
        );
        Ok(CanonicalForm { lines })
    }

    fn is_excluded(&self, tree: &EventTree, id: NodeId) -> bool {
        tree.name(id).is_some_and(|name| self.config.is_excluded(name))
    }

    fn render_children(&self, tree: &EventTree, id: NodeId) -> Result<Rendered, CanonicalError> {
        let schema = self.config.schema();
        let mut entries = Vec::with_capacity(tree.children(id).len());

        for &child in tree.children(id) {
            if self.is_excluded(tree, child) {
                continue;
            }
            let (rank, rendered) = if !tree.is_standard_field(child, schema)
                || self.wraps_extensions(tree, child)
            {
                let lines = self.render_extension(tree, child);
                (Rank::Extension(extension_key(tree, child, &lines)), Rendered {
                    standard: lines,
                    hoisted: Vec::new(),
                })
            } else if tree.is_under_ilmd(child) {
                let lines = self.render_extension(tree, child);
                (Rank::Ilmd(extension_display(tree, child)), Rendered {
                    standard: lines,
                    hoisted: Vec::new(),
                })
            } else {
                // Wrappers whose path resolves nothing follow every catalogued sibling.
                let position = schema
                    .position(tree.field_path(child))
                    .unwrap_or(usize::MAX);
                (Rank::Standard(position), self.render_standard(tree, child)?)
            };
            let serialized = rendered
                .standard
                .iter()
                .chain(&rendered.hoisted)
                .map(String::as_str)
                .collect();
            entries.push(Entry {
                rank,
                has_children: tree.has_children(child),
                serialized,
                rendered,
            });
        }

        entries.sort_by(Entry::compare);

        let hoist = self.config.version().extension_placement() == ExtensionPlacement::Hoisted;
        let mut out = Rendered::default();
        for entry in entries {
            if hoist && matches!(entry.rank, Rank::Extension(_)) {
                out.hoisted.extend(entry.rendered.standard);
            } else {
                out.standard.extend(entry.rendered.standard);
            }
            out.hoisted.extend(entry.rendered.hoisted);
        }
        Ok(out)
    }

    /// Wrappers (unnamed or synthetic nodes) holding nothing but user extensions.
    fn wraps_extensions(&self, tree: &EventTree, id: NodeId) -> bool {
        let schema = self.config.schema();
        field_name(tree, id).is_none()
            && tree.has_children(id)
            && !tree.is_under_ilmd(id)
            && tree.children(id).iter().all(|&child| {
                !tree.is_standard_field(child, schema) || self.wraps_extensions(tree, child)
            })
    }

    fn render_standard(&self, tree: &EventTree, id: NodeId) -> Result<Rendered, CanonicalError> {
        if !tree.has_children(id) {
            let line = format_standard_leaf(tree, id, &self.config)?;
            return Ok(Rendered {
                standard: line.into_iter().collect(),
                hoisted: Vec::new(),
            });
        }
        let mut rendered = self.render_children(tree, id)?;
        if let Some(name) = field_name(tree, id) {
            rendered.standard.insert(0, name.to_string());
        }
        Ok(rendered)
    }

    /// Extension subtrees: `{uri}local` headers, `{uri}local=value` leaves,
    /// siblings sorted by display string.
    fn render_extension(&self, tree: &EventTree, id: NodeId) -> Vec<String> {
        if !tree.has_children(id) {
            return vec![extension_display(tree, id)];
        }
        let mut children: Vec<(String, bool, Vec<String>)> = tree
            .children(id)
            .iter()
            .filter(|&&child| !self.is_excluded(tree, child))
            .map(|&child| {
                let lines = self.render_extension(tree, child);
                (extension_key(tree, child, &lines), tree.has_children(child), lines)
            })
            .collect();
        children.sort_by(|a, b| {
            a.0.cmp(&b.0).then_with(|| {
                if a.1 && b.1 {
                    a.2.concat().cmp(&b.2.concat())
                } else {
                    Ordering::Equal
                }
            })
        });

        let mut lines = Vec::new();
        if let Some(name) = field_name(tree, id) {
            lines.push(qualified_name(tree.namespaces(), name));
        }
        for (_, _, child_lines) in children {
            lines.extend(child_lines);
        }
        lines
    }
}
