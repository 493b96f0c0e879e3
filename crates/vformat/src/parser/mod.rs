//! Incremental text-to-tree parser.
//!
//! The parser is a byte-at-a-time state machine. Everything it knows
//! between calls lives in the [`Parser`] itself, so input can be fed in
//! chunks of any size, split anywhere, and the resulting tree is the same.
//!
//! ```
//! use vformat::{Parser, ParserOptions};
//!
//! let mut parser = Parser::new(ParserOptions::default());
//! parser.feed(b"BEGIN:VCARD\r\nFN:Jane").unwrap();
//! parser.feed(b"\r\n  Doe\r\nEND:VCARD\r\n").unwrap();
//! let doc = parser.finish().unwrap();
//!
//! let card = doc.root().unwrap();
//! let name = doc.object(card).unwrap().properties()[0];
//! assert_eq!(doc.property(name).unwrap().value_string(0).unwrap(), "Jane Doe");
//! ```

mod pending;
#[cfg(test)]
mod tests;

use alloc::collections::VecDeque;

use bstr::BString;

use self::pending::PendingProperty;
use crate::{
    byte_buffer::ByteBuffer,
    codec::{
        base64,
        quoted_printable::{DecodeState, Decoded},
    },
    error::{ParseError, ParseErrorKind, SyntaxError},
    options::ParserOptions,
    string_list::StringList,
    tree::{Document, Encoding, ObjectId, Value},
};

// -----------------------------------------------------------------------------
// Lexer states
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Reading the group, name and qualifiers up to `:`.
    Name,
    /// After `\` inside a name.
    NameEscape,
    /// Reading a text or 8-bit value.
    TextValue,
    /// After a line end in a text value: a space or tab continues the
    /// value, anything else starts the next property.
    TextValueFold,
    /// Reading a quoted-printable value.
    QuotedPrintable(DecodeState),
    /// Buffering a BASE64 line.
    Base64,
}

fn is_line_end(byte: u8) -> bool {
    byte == b'\r' || byte == b'\n'
}

/// Streaming parser building a [`Document`].
///
/// Values seen before the first `BEGIN` are ignored. Any error discards
/// the whole tree built so far; the parser then refuses further input and
/// reports the same error again from [`finish`](Self::finish).
#[derive(Debug)]
pub struct Parser {
    #[cfg(any(test, feature = "fuzzing"))]
    panic_on_error: bool,
    document: Document,
    state: State,
    current: Option<ObjectId>,
    pending: PendingProperty,
    base64_line: ByteBuffer,
    base64: base64::Decoder,
    replay: VecDeque<u8>,
    line: usize,
    column: usize,
    error: Option<ParseError>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(ParserOptions::default())
    }
}

impl Parser {
    /// A parser with an empty document.
    #[must_use]
    pub fn new(options: ParserOptions) -> Self {
        let ParserOptions {
            #[cfg(any(test, feature = "fuzzing"))]
            panic_on_error,
        } = options;
        Self {
            #[cfg(any(test, feature = "fuzzing"))]
            panic_on_error,
            document: Document::new(),
            state: State::Name,
            current: None,
            pending: PendingProperty::default(),
            base64_line: ByteBuffer::new(),
            base64: base64::Decoder::new(),
            replay: VecDeque::new(),
            line: 1,
            column: 1,
            error: None,
        }
    }

    /// The tree built so far.
    #[must_use]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The first top-level object, once its `BEGIN` has been read.
    #[must_use]
    pub fn root(&self) -> Option<ObjectId> {
        self.document.root()
    }

    /// Process `input`.
    ///
    /// # Errors
    ///
    /// Returns the first error in the input. The tree is cleared and every
    /// later call fails with the same error.
    pub fn feed(&mut self, input: &[u8]) -> Result<(), ParseError> {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        for &byte in input {
            if let Err(kind) = self.consume(byte) {
                return Err(self.fail(kind));
            }
            if byte == b'\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        Ok(())
    }

    /// Signal end of input, commit a value still in flight and hand over
    /// the finished tree.
    ///
    /// # Errors
    ///
    /// Returns the error of an earlier failed [`feed`](Self::feed), or a
    /// failure to commit the last value.
    pub fn finish(mut self) -> Result<Document, ParseError> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        let flushed = match self.state {
            State::Name | State::NameEscape => Ok(()),
            State::Base64 => self.decode_base64_line().and_then(|()| self.complete_value()),
            _ => self.complete_value(),
        };
        match flushed {
            Ok(()) => Ok(self.document),
            Err(kind) => Err(self.fail(kind)),
        }
    }

    fn fail(&mut self, kind: ParseErrorKind) -> ParseError {
        let err = ParseError {
            kind,
            line: self.line,
            column: self.column,
        };
        #[cfg(any(test, feature = "fuzzing"))]
        assert!(!self.panic_on_error, "{err}");
        log::debug!("parse failed: {err}");
        self.document.clear();
        self.current = None;
        self.pending = PendingProperty::default();
        self.base64_line.clear();
        self.base64 = base64::Decoder::new();
        self.replay.clear();
        self.error = Some(err.clone());
        err
    }

    fn consume(&mut self, byte: u8) -> Result<(), ParseErrorKind> {
        self.step(byte)?;
        while let Some(byte) = self.replay.pop_front() {
            self.step(byte)?;
        }
        Ok(())
    }

    fn step(&mut self, byte: u8) -> Result<(), ParseErrorKind> {
        match self.state {
            State::Name => self.name_byte(byte),
            State::NameEscape => {
                if byte != b';' {
                    return Err(SyntaxError::InvalidNameEscape(byte).into());
                }
                self.pending.name.append_to_last(b";")?;
                self.state = State::Name;
                Ok(())
            }
            State::TextValue => self.text_byte(byte),
            State::TextValueFold => match byte {
                b'\r' | b'\n' => Ok(()),
                b' ' | b'\t' => {
                    self.state = State::TextValue;
                    Ok(())
                }
                _ => {
                    self.complete_value()?;
                    self.name_byte(byte)
                }
            },
            State::QuotedPrintable(qp) => {
                let (next, decoded) = qp.step(byte)?;
                self.state = State::QuotedPrintable(next);
                match decoded {
                    Decoded::Consumed => Ok(()),
                    Decoded::Byte(b) => Ok(self.pending.strings.append_to_last(&[b])?),
                    Decoded::Separator => Ok(self.pending.strings.push(None)?),
                    Decoded::LineEnd => self.complete_value(),
                }
            }
            State::Base64 => self.base64_byte(byte),
        }
    }

    fn name_byte(&mut self, byte: u8) -> Result<(), ParseErrorKind> {
        match byte {
            b':' => self.begin_value()?,
            b';' => self.pending.push_qualifier()?,
            b'\\' => self.state = State::NameEscape,
            b'\r' | b'\n' => self.pending.reset_name(),
            b'.' if self.pending.name.len() <= 1 => self.pending.move_name_to_group()?,
            _ => self.pending.name.append_to_last(&[byte])?,
        }
        Ok(())
    }

    fn begin_value(&mut self) -> Result<(), ParseErrorKind> {
        let encoding = Encoding::from_name(&self.pending.name);
        self.pending.encoding = encoding;
        self.state = match encoding {
            Encoding::QuotedPrintable => {
                self.pending.strings.push(None)?;
                State::QuotedPrintable(DecodeState::Idle)
            }
            Encoding::Base64 => State::Base64,
            Encoding::EightBit => State::TextValue,
            Encoding::SevenBit | Encoding::Object => {
                self.pending.strings.push(None)?;
                State::TextValue
            }
        };
        Ok(())
    }

    fn text_byte(&mut self, byte: u8) -> Result<(), ParseErrorKind> {
        if is_line_end(byte) {
            self.state = State::TextValueFold;
        } else if self.pending.encoding == Encoding::EightBit {
            self.pending.push_byte(byte)?;
        } else if byte == b';' {
            self.pending.strings.push(None)?;
        } else {
            self.pending.strings.append_to_last(&[byte])?;
        }
        Ok(())
    }

    fn base64_byte(&mut self, byte: u8) -> Result<(), ParseErrorKind> {
        match byte {
            b'\r' | b'\n' => self.decode_base64_line(),
            // Data never contains these, so the line is really the next
            // property, written without the customary blank line.
            b':' | b';' => {
                self.base64_line.push(byte)?;
                let trailer = self.base64_line.take();
                log::trace!(
                    "reinterpreting {:?} after BASE64 data as a property name",
                    bstr::BStr::new(&trailer)
                );
                self.complete_value()?;
                self.replay.try_reserve(trailer.len())?;
                for &b in trailer.iter().rev() {
                    self.replay.push_front(b);
                }
                Ok(())
            }
            _ => Ok(self.base64_line.push(byte)?),
        }
    }

    fn decode_base64_line(&mut self) -> Result<(), ParseErrorKind> {
        self.base64
            .decode(self.base64_line.as_slice(), &mut self.pending.bytes)?;
        self.base64_line.clear();
        Ok(())
    }

    /// Commit the property just read: open a nested or top-level object on
    /// `BEGIN`, close one on `END`, otherwise append the property to the
    /// object being read.
    fn complete_value(&mut self) -> Result<(), ParseErrorKind> {
        if self.pending.encoding == Encoding::Base64 {
            self.base64.finish(&mut self.pending.bytes)?;
        }
        self.state = State::Name;
        let pending = core::mem::take(&mut self.pending);
        let marker = |m: &[u8]| pending.name.get(0).is_some_and(|n| n.eq_ignore_ascii_case(m));

        if marker(b"BEGIN") {
            let (_, _, value) = pending.into_parts();
            let kind = match value {
                Value::Text(mut s) | Value::QuotedPrintable(mut s) => s.take(0).unwrap_or_default(),
                Value::EightBit(b) | Value::Base64(b) => BString::from(b),
                Value::Object(_) => BString::default(),
            };
            let child = self.document.create_object(&kind)?;
            match self.current {
                Some(parent) => {
                    let mut name = StringList::new();
                    name.push(Some(kind.as_slice()))?;
                    self.document
                        .insert_property(parent, None, name, Value::Object(child))?;
                }
                None => self.document.push_root(child)?,
            }
            log::trace!("begin {kind}");
            self.current = Some(child);
        } else if marker(b"END") {
            if let Some(object) = self.current.and_then(|id| self.document.object(id)) {
                log::trace!("end {}", object.kind());
                self.current = object.parent();
            }
        } else if let Some(current) = self.current {
            let (group, name, value) = pending.into_parts();
            self.document.insert_property(current, group, name, value)?;
        }
        Ok(())
    }
}

/// Parse a complete input in one call.
///
/// # Errors
///
/// Fails on the first syntax or allocation error.
pub fn parse(input: &[u8]) -> Result<Document, ParseError> {
    let mut parser = Parser::default();
    parser.feed(input)?;
    parser.finish()
}
