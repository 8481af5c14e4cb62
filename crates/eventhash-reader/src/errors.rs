use eventhash_canonical::{CanonicalError, ConfigError};
use thiserror::Error;

/// Errors raised by the streaming JSON extractor.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// I/O error while pulling bytes from the source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The byte stream is not well-formed JSON.
    #[error("invalid JSON at offset {offset}: {reason}")]
    Syntax {
        /// Byte offset where the problem was detected.
        offset: u64,
        /// Reason for invalidity.
        reason: String,
    },
    /// A buffered value could not be parsed (from serde_json).
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
    /// The document is neither an object nor an array.
    #[error("expected a JSON object or array at offset {offset}")]
    UnexpectedTopLevel {
        /// Byte offset of the offending token.
        offset: u64,
    },
    /// One event (or header value) exceeds the buffering limit.
    #[error("value of {size} bytes exceeds maximum {max}")]
    EventTooLarge {
        /// Bytes buffered when the limit tripped.
        size: usize,
        /// Configured maximum.
        max: usize,
    },
    /// Demand must be zero or positive.
    #[error("negative demand {0}")]
    NegativeDemand(i64),
}

/// Errors raised while reading events and hashing them.
#[derive(Error, Debug)]
pub enum ReaderError {
    /// I/O error during read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed XML (from quick-xml).
    #[error("XML error at position {position}: {source}")]
    Xml {
        /// Byte position reported by the parser.
        position: u64,
        /// Underlying parser error.
        source: quick_xml::Error,
    },
    /// XML construct that is refused outright.
    #[error("XML not accepted: {0}")]
    XmlRejected(String),
    /// JSON extraction failed.
    #[error(transparent)]
    Extract(#[from] ExtractError),
    /// Wrong top-level shape for the requested mode.
    #[error("unexpected event shape: {0}")]
    Shape(String),
    /// Formatting one event failed.
    #[error("canonicalization failed: {0}")]
    Canonical(#[from] CanonicalError),
    /// Invalid configuration for the requested result shape.
    #[error("configuration rejected: {0}")]
    Config(#[from] ConfigError),
}
