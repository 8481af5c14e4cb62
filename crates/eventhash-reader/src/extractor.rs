//! Demand-driven extraction of events from a JSON byte stream.
//!
//! The extractor accepts either an EPCIS document object (header fields plus
//! an `eventList` array, possibly nested under `epcisBody` / `queryResults` /
//! `resultsBody`), a bare array of event objects, or a single bare event. It
//! buffers one event at a time; the rest of the document is never held in
//! memory.
//!
//! ```rust
//! use eventhash_reader::{EventExtractor, Extracted};
//!
//! let doc = br#"{"type": "EPCISDocument", "epcisBody": {"eventList": [
//!     {"type": "ObjectEvent", "action": "OBSERVE"},
//!     {"type": "ObjectEvent", "action": "ADD"}
//! ]}}"#;
//! let mut extractor = EventExtractor::new(&doc[..]);
//! let batch = extractor.request(1)?;
//! assert_eq!(batch.items.len(), 1);
//! assert!(!batch.complete);
//! let batch = extractor.request(10)?;
//! assert_eq!(batch.items.len(), 1);
//! assert!(batch.complete);
//! assert!(matches!(&batch.items[0], Extracted::Event(e) if e["action"] == "ADD"));
//! # Ok::<(), eventhash_reader::ExtractError>(())
//! ```

use std::io::Read;

use eventhash_canonical::is_event_type;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::cursor::JsonCursor;
use crate::errors::ExtractError;

/// Largest event (or header value) buffered by default: 16 MiB.
pub const DEFAULT_MAX_EVENT_BYTES: usize = 16 * 1024 * 1024;

/// Key of the event array inside a document.
pub const EVENT_LIST: &str = "eventList";

/// Container objects walked through on the way to `eventList`.
const BODY_CONTAINERS: &[&str] = &["epcisBody", "queryResults", "resultsBody"];

/// Header keys required before the header is surfaced as a document.
const DOCUMENT_MARKERS: &[&str] = &["@context", "type", "schemaVersion", "creationDate"];

/// Buffering limits for one extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractorLimits {
    /// Maximum bytes buffered for a single event or header value.
    pub max_event_bytes: usize,
}

impl Default for ExtractorLimits {
    fn default() -> Self {
        Self {
            max_event_bytes: DEFAULT_MAX_EVENT_BYTES,
        }
    }
}

/// One item produced by the extractor.
#[derive(Debug, Clone, PartialEq)]
pub enum Extracted {
    /// An event object carrying a `type` field.
    Event(Value),
    /// The document header, once the whole document has been read and only
    /// when it looks like an EPCIS document.
    Header(Value),
}

/// Items delivered for one [`EventExtractor::request`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    /// At most the requested number of items.
    pub items: Vec<Extracted>,
    /// True once no further items will ever be produced.
    pub complete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    Fields,
    Events { first: bool },
    Done,
}

/// A descended body container whose fields are being read.
struct Container {
    key: String,
    fields: Map<String, Value>,
    first: bool,
}

/// Pull-based event extractor over a JSON byte stream.
pub struct EventExtractor<R> {
    cursor: JsonCursor<R>,
    limits: ExtractorLimits,
    phase: Phase,
    header: Map<String, Value>,
    header_first: bool,
    containers: Vec<Container>,
    saw_event_list: bool,
    bare_array: bool,
    emitted: usize,
}

impl<R: Read> EventExtractor<R> {
    /// Creates an extractor with default limits.
    pub fn new(reader: R) -> Self {
        Self::with_limits(reader, ExtractorLimits::default())
    }

    /// Creates an extractor with explicit limits.
    pub fn with_limits(reader: R, limits: ExtractorLimits) -> Self {
        Self {
            cursor: JsonCursor::new(reader),
            limits,
            phase: Phase::Start,
            header: Map::new(),
            header_first: true,
            containers: Vec::new(),
            saw_event_list: false,
            bare_array: false,
            emitted: 0,
        }
    }

    /// Header fields read so far. Fields preceding `eventList` are available
    /// before the first event is delivered.
    pub fn header(&self) -> &Map<String, Value> {
        &self.header
    }

    /// Whether the extractor has finished (end of input, cancellation or a
    /// previous error).
    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Done
    }

    /// Stops extraction. No further bytes are read.
    pub fn cancel(&mut self) {
        if self.phase != Phase::Done {
            debug!(emitted = self.emitted, "extraction cancelled");
        }
        self.phase = Phase::Done;
    }

    /// Pulls up to `n` items.
    ///
    /// Demand beyond what remains yields a short batch marked complete;
    /// demand after completion yields an empty complete batch.
    pub fn request(&mut self, n: i64) -> Result<Batch, ExtractError> {
        if n < 0 {
            return Err(ExtractError::NegativeDemand(n));
        }
        let mut batch = Batch::default();
        while (batch.items.len() as i64) < n {
            match self.pull()? {
                Some(item) => batch.items.push(item),
                None => break,
            }
        }
        batch.complete = self.is_complete();
        Ok(batch)
    }

    fn pull(&mut self) -> Result<Option<Extracted>, ExtractError> {
        let result = self.step();
        match &result {
            Err(_) => self.phase = Phase::Done,
            Ok(Some(_)) => self.emitted += 1,
            Ok(None) => {}
        }
        result
    }

    fn step(&mut self) -> Result<Option<Extracted>, ExtractError> {
        loop {
            match self.phase {
                Phase::Done => return Ok(None),
                Phase::Start => self.start()?,
                Phase::Fields => {
                    if let Some(item) = self.next_field()? {
                        return Ok(Some(item));
                    }
                }
                Phase::Events { first } => {
                    if let Some(item) = self.next_event(first)? {
                        return Ok(Some(item));
                    }
                }
            }
        }
    }

    fn start(&mut self) -> Result<(), ExtractError> {
        match self.cursor.peek_significant()? {
            Some(b'{') => {
                self.cursor.expect(b'{')?;
                self.phase = Phase::Fields;
            }
            Some(b'[') => {
                self.cursor.expect(b'[')?;
                self.bare_array = true;
                self.saw_event_list = true;
                self.phase = Phase::Events { first: true };
            }
            Some(_) => {
                return Err(ExtractError::UnexpectedTopLevel {
                    offset: self.cursor.offset(),
                })
            }
            None => {
                return Err(ExtractError::Syntax {
                    offset: self.cursor.offset(),
                    reason: "empty document".to_string(),
                })
            }
        }
        Ok(())
    }

    fn take_first_flag(&mut self) -> bool {
        let flag = match self.containers.last_mut() {
            Some(container) => &mut container.first,
            None => &mut self.header_first,
        };
        std::mem::replace(flag, false)
    }

    fn current_fields(&mut self) -> &mut Map<String, Value> {
        match self.containers.last_mut() {
            Some(container) => &mut container.fields,
            None => &mut self.header,
        }
    }

    /// Reads one key/value pair of the object being walked. Returns an item
    /// only when the root object closes.
    fn next_field(&mut self) -> Result<Option<Extracted>, ExtractError> {
        if self.cursor.consume_if(b'}')? {
            return match self.containers.pop() {
                Some(container) => {
                    self.current_fields()
                        .insert(container.key, Value::Object(container.fields));
                    Ok(None)
                }
                None => self.finish(),
            };
        }
        if !self.take_first_flag() {
            self.cursor.expect(b',')?;
        }
        let key = self.cursor.read_string()?;
        self.cursor.expect(b':')?;

        if key == EVENT_LIST && self.cursor.consume_if(b'[')? {
            self.saw_event_list = true;
            self.phase = Phase::Events { first: true };
            return Ok(None);
        }
        if BODY_CONTAINERS.contains(&key.as_str()) && self.cursor.consume_if(b'{')? {
            self.containers.push(Container {
                key,
                fields: Map::new(),
                first: true,
            });
            return Ok(None);
        }
        let raw = self.cursor.capture_value(self.limits.max_event_bytes)?;
        let value: Value = serde_json::from_slice(&raw)?;
        self.current_fields().insert(key, value);
        Ok(None)
    }

    /// Reads one entry of the event array.
    fn next_event(&mut self, first: bool) -> Result<Option<Extracted>, ExtractError> {
        if self.cursor.consume_if(b']')? {
            if self.bare_array {
                return self.finish();
            }
            self.phase = Phase::Fields;
            return Ok(None);
        }
        if !first {
            self.cursor.expect(b',')?;
        }
        self.phase = Phase::Events { first: false };

        let raw = self.cursor.capture_value(self.limits.max_event_bytes)?;
        let value: Value = serde_json::from_slice(&raw)?;
        let typed = value
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_string);
        match typed {
            Some(kind) => {
                debug!(event_type = %kind, index = self.emitted, "extracted event");
                Ok(Some(Extracted::Event(value)))
            }
            None => {
                warn!(offset = self.cursor.offset(), "dropping eventList entry without a type");
                Ok(None)
            }
        }
    }

    /// Checks for trailing input and decides what the header becomes.
    fn finish(&mut self) -> Result<Option<Extracted>, ExtractError> {
        if self.cursor.peek_significant()?.is_some() {
            return Err(ExtractError::Syntax {
                offset: self.cursor.offset(),
                reason: "trailing characters after document".to_string(),
            });
        }
        self.phase = Phase::Done;
        if self.bare_array {
            return Ok(None);
        }

        let header_type = self.header.get("type").and_then(Value::as_str);
        if !self.saw_event_list && header_type.is_some_and(is_event_type) {
            debug!("top-level object is a bare event");
            return Ok(Some(Extracted::Event(Value::Object(self.header.clone()))));
        }
        if DOCUMENT_MARKERS.iter().all(|k| self.header.contains_key(*k)) {
            return Ok(Some(Extracted::Header(Value::Object(self.header.clone()))));
        }
        Ok(None)
    }
}

impl<R: Read> Iterator for EventExtractor<R> {
    type Item = Result<Extracted, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pull().transpose()
    }
}
