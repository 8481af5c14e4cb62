//! End-to-end pipeline: bytes in, one [`DigestResult`] per event out.

use std::io::{BufRead, Read};
use std::sync::Arc;

use eventhash_canonical::{
    CanonicalForm, Canonicalizer, DigestResult, EventTree, HashConfig, Namespaces,
};
use tracing::debug;

use crate::errors::ReaderError;
use crate::extractor::{EventExtractor, Extracted, ExtractorLimits};
use crate::json::{build_event_tree, merge_context};
use crate::xml::XmlEventReader;

/// Computes event hashes for XML and JSON sources under one [`HashConfig`].
///
/// The generator holds only immutable configuration and can be shared across
/// threads; each source gets its own reader state.
///
/// ```rust
/// use eventhash_canonical::HashConfig;
/// use eventhash_reader::EventHashGenerator;
///
/// let generator = EventHashGenerator::new(HashConfig::default());
/// let xml = r#"<ObjectEvent>
///     <eventTime>2021-05-27T13:00:00Z</eventTime>
///     <action>OBSERVE</action>
/// </ObjectEvent>"#;
/// let json = r#"{"type": "ObjectEvent", "action": "OBSERVE", "eventTime": "2021-05-27T13:00:00Z"}"#;
///
/// let from_xml: Vec<_> = generator.from_xml(xml.as_bytes()).collect::<Result<_, _>>()?;
/// let from_json: Vec<_> = generator.from_json(json.as_bytes()).collect::<Result<_, _>>()?;
/// assert_eq!(from_xml, from_json);
/// # Ok::<(), eventhash_reader::ReaderError>(())
/// ```
#[derive(Clone)]
pub struct EventHashGenerator {
    canonicalizer: Arc<Canonicalizer>,
    limits: ExtractorLimits,
}

impl EventHashGenerator {
    /// Creates a generator with default extractor limits.
    pub fn new(config: HashConfig) -> Self {
        Self {
            canonicalizer: Arc::new(Canonicalizer::new(config)),
            limits: ExtractorLimits::default(),
        }
    }

    /// Replaces the JSON extractor limits.
    pub fn with_limits(mut self, limits: ExtractorLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &HashConfig {
        self.canonicalizer.config()
    }

    /// Pre-hash lines of an already built tree.
    pub fn canonicalize_tree(&self, tree: &EventTree) -> Result<CanonicalForm, ReaderError> {
        Ok(self.canonicalizer.canonicalize(tree)?)
    }

    /// Renders every configured output for an already built tree.
    pub fn hash_tree(&self, tree: &EventTree) -> Result<DigestResult, ReaderError> {
        let form = self.canonicalize_tree(tree)?;
        let config = self.config();
        Ok(DigestResult::from_form(
            &form,
            config.outputs(),
            config.join(),
            config.version(),
        ))
    }

    /// Hashes every event of a JSON source (document, bare event, or array).
    pub fn from_json<R: Read>(&self, reader: R) -> JsonHashes<'_, R> {
        JsonHashes {
            generator: self,
            extractor: EventExtractor::with_limits(reader, self.limits),
            namespaces: None,
            failed: false,
        }
    }

    /// Hashes every event of an XML document.
    pub fn from_xml<R: BufRead>(&self, reader: R) -> XmlHashes<'_, R> {
        XmlHashes {
            generator: self,
            events: XmlEventReader::new(reader, self.config()),
            failed: false,
        }
    }

    /// Like [`from_json`](Self::from_json), yielding the single configured
    /// output per event. Fails before reading when several are configured.
    pub fn from_json_single<R: Read>(
        &self,
        reader: R,
    ) -> Result<SingleOutput<JsonHashes<'_, R>>, ReaderError> {
        self.config().require_single_output()?;
        Ok(SingleOutput {
            inner: self.from_json(reader),
        })
    }

    /// Like [`from_xml`](Self::from_xml), yielding the single configured
    /// output per event. Fails before reading when several are configured.
    pub fn from_xml_single<R: BufRead>(
        &self,
        reader: R,
    ) -> Result<SingleOutput<XmlHashes<'_, R>>, ReaderError> {
        self.config().require_single_output()?;
        Ok(SingleOutput {
            inner: self.from_xml(reader),
        })
    }
}

/// Results of [`EventHashGenerator::from_json`], in source order.
pub struct JsonHashes<'g, R> {
    generator: &'g EventHashGenerator,
    extractor: EventExtractor<R>,
    namespaces: Option<Arc<Namespaces>>,
    failed: bool,
}

impl<R: Read> JsonHashes<'_, R> {
    /// Stops reading the source; no further results are produced.
    pub fn cancel(&mut self) {
        self.extractor.cancel();
    }
}

impl<R: Read> Iterator for JsonHashes<'_, R> {
    type Item = Result<DigestResult, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let event = match self.extractor.next()? {
                Ok(Extracted::Event(event)) => event,
                Ok(Extracted::Header(_)) => continue,
                Err(err) => {
                    self.failed = true;
                    return Some(Err(err.into()));
                }
            };
            let extractor = &self.extractor;
            let namespaces = self
                .namespaces
                .get_or_insert_with(|| {
                    let mut namespaces = Namespaces::new();
                    if let Some(context) = extractor.header().get("@context") {
                        merge_context(&mut namespaces, context);
                    }
                    Arc::new(namespaces)
                })
                .clone();
            let result = build_event_tree(&event, namespaces, self.generator.config())
                .and_then(|tree| self.generator.hash_tree(&tree));
            match &result {
                Ok(_) => debug!("hashed JSON event"),
                Err(_) => self.failed = true,
            }
            return Some(result);
        }
    }
}

/// Results of [`EventHashGenerator::from_xml`], in source order.
pub struct XmlHashes<'g, R> {
    generator: &'g EventHashGenerator,
    events: XmlEventReader<'g, R>,
    failed: bool,
}

impl<R: BufRead> Iterator for XmlHashes<'_, R> {
    type Item = Result<DigestResult, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let result = self
            .events
            .next()?
            .and_then(|tree| self.generator.hash_tree(&tree));
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}

/// Single-string result shape over a result iterator.
pub struct SingleOutput<I> {
    inner: I,
}

impl<I> Iterator for SingleOutput<I>
where
    I: Iterator<Item = Result<DigestResult, ReaderError>>,
{
    type Item = Result<String, ReaderError>;

    fn next(&mut self) -> Option<Self::Item> {
        let result = self.inner.next()?;
        Some(result.map(|digests| digests.into_first().unwrap_or_default()))
    }
}
