//! Pull-based JSON token cursor over a byte stream.
//!
//! The cursor understands just enough JSON to walk object keys and array
//! boundaries; whole values are captured as raw bytes and parsed separately,
//! so at most one value is buffered at a time.

use std::io::{self, BufRead, BufReader, Read};

use crate::errors::ExtractError;

/// JSON cursor reading lazily from `R`.
pub struct JsonCursor<R> {
    reader: BufReader<R>,
    offset: u64,
}

impl<R: Read> JsonCursor<R> {
    /// Wraps a byte source.
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            offset: 0,
        }
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    fn syntax(&self, reason: impl Into<String>) -> ExtractError {
        ExtractError::Syntax {
            offset: self.offset,
            reason: reason.into(),
        }
    }

    fn peek_byte(&mut self) -> Result<Option<u8>, ExtractError> {
        loop {
            match self.reader.fill_buf() {
                Ok(buf) => return Ok(buf.first().copied()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn next_byte(&mut self) -> Result<Option<u8>, ExtractError> {
        let byte = self.peek_byte()?;
        if byte.is_some() {
            self.reader.consume(1);
            self.offset += 1;
        }
        Ok(byte)
    }

    fn require_byte(&mut self) -> Result<u8, ExtractError> {
        self.next_byte()?
            .ok_or_else(|| self.syntax("unexpected end of input"))
    }

    fn skip_whitespace(&mut self) -> Result<(), ExtractError> {
        while let Some(b) = self.peek_byte()? {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => {
                    self.next_byte()?;
                }
                // UTF-8 byte order mark
                0xEF if self.offset == 0 => {
                    for expected in [0xEF, 0xBB, 0xBF] {
                        if self.next_byte()? != Some(expected) {
                            return Err(self.syntax("invalid byte order mark"));
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    /// Next non-whitespace byte without consuming it; `None` at end of input.
    pub fn peek_significant(&mut self) -> Result<Option<u8>, ExtractError> {
        self.skip_whitespace()?;
        self.peek_byte()
    }

    /// Consumes `byte` if it is the next significant byte.
    pub fn consume_if(&mut self, byte: u8) -> Result<bool, ExtractError> {
        if self.peek_significant()? == Some(byte) {
            self.next_byte()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consumes `byte` or fails.
    pub fn expect(&mut self, byte: u8) -> Result<(), ExtractError> {
        if self.consume_if(byte)? {
            Ok(())
        } else {
            let found = self.peek_byte()?;
            Err(self.syntax(match found {
                Some(b) => format!("expected '{}', found '{}'", byte as char, b as char),
                None => format!("expected '{}', found end of input", byte as char),
            }))
        }
    }

    /// Reads an object key or string value, decoding escapes.
    pub fn read_string(&mut self) -> Result<String, ExtractError> {
        self.expect(b'"')?;
        let mut bytes = Vec::new();
        loop {
            match self.require_byte()? {
                b'"' => break,
                b'\\' => self.read_escape(&mut bytes)?,
                b if b < 0x20 => return Err(self.syntax("control character in string")),
                b => bytes.push(b),
            }
        }
        String::from_utf8(bytes).map_err(|_| self.syntax("invalid UTF-8 in string"))
    }

    fn read_hex4(&mut self) -> Result<u32, ExtractError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let b = self.require_byte()?;
            let digit = (b as char)
                .to_digit(16)
                .ok_or_else(|| self.syntax("invalid \\u escape"))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn read_escape(&mut self, out: &mut Vec<u8>) -> Result<(), ExtractError> {
        let ch = match self.require_byte()? {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{08}',
            b'f' => '\u{0C}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => {
                let high = self.read_hex4()?;
                let code = if (0xD800..0xDC00).contains(&high) {
                    if self.require_byte()? != b'\\' || self.require_byte()? != b'u' {
                        return Err(self.syntax("unpaired surrogate"));
                    }
                    let low = self.read_hex4()?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(self.syntax("unpaired surrogate"));
                    }
                    0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                } else {
                    high
                };
                char::from_u32(code).ok_or_else(|| self.syntax("invalid code point"))?
            }
            other => {
                return Err(self.syntax(format!("invalid escape '\\{}'", other as char)));
            }
        };
        let mut buf = [0u8; 4];
        out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        Ok(())
    }

    /// Captures the raw bytes of the next complete value (object, array,
    /// string or literal), failing once more than `max` bytes accumulate.
    pub fn capture_value(&mut self, max: usize) -> Result<Vec<u8>, ExtractError> {
        let mut buf = Vec::new();
        match self.peek_significant()? {
            None => return Err(self.syntax("expected a value, found end of input")),
            Some(b'"') => {
                self.next_byte()?;
                buf.push(b'"');
                self.capture_string_tail(&mut buf, max)?;
            }
            Some(b'{') | Some(b'[') => {
                let mut depth = 0usize;
                loop {
                    let b = self.require_byte()?;
                    buf.push(b);
                    match b {
                        b'"' => self.capture_string_tail(&mut buf, max)?,
                        b'{' | b'[' => depth += 1,
                        b'}' | b']' => {
                            depth -= 1;
                            if depth == 0 {
                                break;
                            }
                        }
                        _ => {}
                    }
                    Self::check_size(&buf, max)?;
                }
            }
            Some(_) => {
                while let Some(b) = self.peek_byte()? {
                    if matches!(b, b',' | b'}' | b']' | b' ' | b'\t' | b'\n' | b'\r') {
                        break;
                    }
                    self.next_byte()?;
                    buf.push(b);
                    Self::check_size(&buf, max)?;
                }
            }
        }
        Ok(buf)
    }

    fn capture_string_tail(&mut self, buf: &mut Vec<u8>, max: usize) -> Result<(), ExtractError> {
        loop {
            let b = self.require_byte()?;
            buf.push(b);
            match b {
                b'\\' => buf.push(self.require_byte()?),
                b'"' => return Ok(()),
                _ => {}
            }
            Self::check_size(buf, max)?;
        }
    }

    fn check_size(buf: &[u8], max: usize) -> Result<(), ExtractError> {
        if buf.len() > max {
            return Err(ExtractError::EventTooLarge {
                size: buf.len(),
                max,
            });
        }
        Ok(())
    }
}
