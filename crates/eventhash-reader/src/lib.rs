//! Streaming readers that turn EPCIS XML and JSON sources into event hashes.
//!
//! This crate provides:
//! - A pull-based JSON event extractor with bounded buffering and demand
//!   (`request(n)`) semantics
//! - JSON and XML builders producing equivalent [`EventTree`]s
//! - [`EventHashGenerator`], the pipeline from bytes to one
//!   [`DigestResult`] per event
//!
//! ## Quick Start
//!
//! ```rust
//! use eventhash_canonical::HashConfig;
//! use eventhash_reader::EventHashGenerator;
//!
//! let config = HashConfig::builder().outputs(["prehash", "sha-256"]).build()?;
//! let generator = EventHashGenerator::new(config);
//!
//! let document = r#"{
//!   "@context": ["https://ref.gs1.org/standards/epcis/epcis-context.jsonld"],
//!   "type": "EPCISDocument",
//!   "epcisBody": {"eventList": [{
//!     "type": "ObjectEvent",
//!     "eventTime": "2021-05-27T13:00:00Z",
//!     "action": "OBSERVE",
//!     "epcList": ["urn:epc:id:sgtin:0614141.107346.2017"]
//!   }]}
//! }"#;
//!
//! for result in generator.from_json(document.as_bytes()) {
//!     let result = result?;
//!     assert!(result.get("prehash").unwrap().starts_with("eventType=ObjectEvent"));
//!     assert!(result.get("sha-256").unwrap().ends_with("?ver=CBV2.0"));
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Key Types
//!
//! - [`EventHashGenerator`] - Hash every event of an XML or JSON source
//! - [`EventExtractor`] - Pull events out of a large JSON document
//! - [`XmlEventReader`] - Build event trees from an XML document
//!
//! [`EventTree`]: eventhash_canonical::EventTree
//! [`DigestResult`]: eventhash_canonical::DigestResult

#![deny(missing_docs)]

/// JSON token cursor.
pub mod cursor;
/// Error types for extraction and reading.
pub mod errors;
/// Streaming JSON event extractor.
pub mod extractor;
/// Source-to-hash pipeline.
pub mod generator;
/// JSON event builder.
pub mod json;
/// XML event builder.
pub mod xml;

pub use cursor::JsonCursor;
pub use errors::{ExtractError, ReaderError};
pub use extractor::{Batch, EventExtractor, Extracted, ExtractorLimits, DEFAULT_MAX_EVENT_BYTES};
pub use generator::{EventHashGenerator, JsonHashes, SingleOutput, XmlHashes};
pub use json::{build_event_tree, merge_context};
pub use xml::XmlEventReader;
