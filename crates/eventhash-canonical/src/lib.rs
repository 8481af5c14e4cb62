//! Canonical pre-hash model for EPCIS events.
//!
//! An event (from XML or JSON) is first built into an [`EventTree`]; the
//! [`Canonicalizer`] orders its fields per the versioned [`FieldSchema`] and
//! formats each one, producing a [`CanonicalForm`]; [`DigestResult`] then
//! renders the requested outputs (`prehash` or `ni:///` digest identifiers).
//!
//! This crate performs no I/O. Builders live in `eventhash-reader`.
//!
//! ```rust
//! use std::sync::Arc;
//! use eventhash_canonical::{Canonicalizer, DigestResult, EventTree, HashConfig, Namespaces};
//!
//! let config = HashConfig::builder().outputs(["prehash", "sha-256"]).build()?;
//! let mut tree = EventTree::new(Arc::new(Namespaces::new()));
//! let root = tree.root();
//! tree.add_leaf(root, "type", "ObjectEvent");
//! tree.add_leaf(root, "action", "OBSERVE");
//! tree.add_leaf(root, "eventTime", "2021-05-27T13:00:00Z");
//!
//! let form = Canonicalizer::new(config.clone()).canonicalize(&tree)?;
//! let result = DigestResult::from_form(&form, config.outputs(), config.join(), config.version());
//! assert_eq!(
//!     result.get("prehash"),
//!     Some("eventType=ObjectEventeventTime=2021-05-27T13:00:00.000Zaction=OBSERVE")
//! );
//! assert!(result.get("sha-256").unwrap().starts_with("ni:///sha-256;"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
#![deny(missing_docs)]

/// Field ordering and serialization of event trees.
pub mod canonicalizer;
/// Hash configuration (version, exclusions, join string, outputs).
pub mod config;
/// Digest algorithms, output kinds and identifier formatting.
pub mod digest;
/// Error types.
pub mod errors;
/// Per-leaf formatting rules.
pub mod format;
/// EPC URN to Digital Link conversion.
pub mod identifiers;
/// Field ordering catalog per CBV version.
pub mod schema;
/// Arena-backed event tree.
pub mod tree;
/// CBV / GS1 vocabulary rewriting.
pub mod vocabulary;

pub use canonicalizer::{CanonicalForm, Canonicalizer};
pub use config::{
    parse_field_list, CbvVersion, ExtensionPlacement, HashConfig, HashConfigBuilder,
    DEFAULT_EXCLUDED_FIELDS,
};
pub use digest::{ni_identifier, DigestAlg, DigestResult, HashOutput, PREHASH};
pub use errors::{CanonicalError, ConfigError};
pub use format::{is_event_type, EVENT_TYPES, IDENTIFIER_LISTS};
pub use schema::FieldSchema;
pub use tree::{EventTree, Namespaces, NodeId};
