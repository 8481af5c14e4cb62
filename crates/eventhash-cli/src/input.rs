//! Input opening and format detection.

use std::fs::File;
use std::io::{self, BufRead, BufReader};

use clap::ValueEnum;

use crate::errors::CliError;

/// Source syntax of the input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Decide from the first significant byte (`<` means XML).
    Auto,
    /// EPCIS XML document or bare event element.
    Xml,
    /// EPCIS JSON / JSON-LD document, event, or array of events.
    Json,
}

/// Opens the named file, or stdin when no path is given.
pub fn open(path: Option<&str>) -> Result<Box<dyn BufRead>, CliError> {
    match path {
        Some(path) => {
            let file = File::open(path).map_err(|source| CliError::Input {
                path: path.to_string(),
                source,
            })?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// Resolves `Auto` by skipping leading whitespace and peeking at the next byte.
pub fn detect(reader: &mut dyn BufRead, requested: Format) -> Result<Format, CliError> {
    if requested != Format::Auto {
        return Ok(requested);
    }
    loop {
        let buf = reader.fill_buf()?;
        if buf.is_empty() {
            return Ok(Format::Json);
        }
        match buf.iter().position(|b| !b.is_ascii_whitespace()) {
            Some(idx) => {
                let format = if buf[idx] == b'<' { Format::Xml } else { Format::Json };
                reader.consume(idx);
                tracing::debug!(?format, "detected input format");
                return Ok(format);
            }
            None => {
                let len = buf.len();
                reader.consume(len);
            }
        }
    }
}
