//! Incremental tree-to-text writer.
//!
//! [`Writer::next_chunk`] fills a caller-provided buffer and returns how
//! many bytes it wrote; `0` means the object (or the sibling chain) has been
//! written completely. Nested objects are walked with an explicit stack of
//! frames rather than by recursion, and every formatted token is staged in
//! a pending buffer so that an escape sequence or BASE64 quantum is never
//! torn apart between two calls.


use alloc::vec::Vec;

use crate::{
    byte_buffer::ByteBuffer,
    codec::{base64, quoted_printable::Encoder},
    error::WriteError,
    options::{WriteScope, WriterOptions},
    string_list::StringList,
    tree::{Document, Encoding, Object, ObjectId, Property, Value},
};

const CRLF: &[u8] = b"\r\n";
const FOLD: &[u8] = b"\r\n ";

/// Size of the scratch buffer used by [`write_to_vec`].
const CHUNK_SIZE: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameState {
    Begin,
    Name,
    Value,
    End,
    Done,
}

/// Cursor into one object being written.
#[derive(Debug, Clone, Copy)]
struct Frame {
    object: ObjectId,
    /// Index into the object's property list.
    property: usize,
    /// Progress within the current value; a byte offset for BASE64.
    offset: usize,
    state: FrameState,
}

impl Frame {
    fn new(object: ObjectId) -> Self {
        Self {
            object,
            property: 0,
            offset: 0,
            state: FrameState::Begin,
        }
    }

    fn next_property(&mut self) {
        self.property += 1;
        self.offset = 0;
        self.state = FrameState::Name;
    }
}

/// Streams an object tree out as vCard/vCalendar text.
///
/// ```
/// use vformat::{Writer, WriterOptions};
///
/// let doc = vformat::parse(b"BEGIN:VCARD\r\nFN:Jane\r\nEND:VCARD\r\n").unwrap();
/// let mut writer = Writer::new(&doc, doc.root().unwrap(), WriterOptions::default());
/// let mut out = Vec::new();
/// let mut buf = [0u8; 8];
/// loop {
///     let n = writer.next_chunk(&mut buf).unwrap();
///     if n == 0 {
///         break;
///     }
///     out.extend_from_slice(&buf[..n]);
/// }
/// assert_eq!(out, b"BEGIN:VCARD\r\nFN:Jane\r\nEND:VCARD\r\n");
/// ```
#[derive(Debug)]
pub struct Writer<'d> {
    document: &'d Document,
    options: WriterOptions,
    frames: Vec<Frame>,
    pending: ByteBuffer,
    /// Bytes on the current output line, for folding and soft breaks.
    column: usize,
    failed: bool,
}

impl<'d> Writer<'d> {
    /// Prepare to write `object`, and with [`WriteScope::Siblings`] every
    /// top-level object after it.
    #[must_use]
    pub fn new(document: &'d Document, object: ObjectId, options: WriterOptions) -> Self {
        Self {
            document,
            options,
            frames: Vec::from([Frame::new(object)]),
            pending: ByteBuffer::new(),
            column: 0,
            failed: false,
        }
    }

    /// `true` once everything has been handed out.
    #[must_use]
    pub fn is_done(&self) -> bool {
        !self.failed && self.frames.is_empty() && self.pending.is_empty()
    }

    /// Write as much as fits into `out`, returning the number of bytes
    /// written. `Ok(0)` means the output is complete.
    ///
    /// # Errors
    ///
    /// Fails on an empty `out`, a dangling handle, an 8-bit value (which
    /// has no wire form), a name or text string holding a line break or
    /// another byte without an escape, or an allocation failure. After a failure the
    /// writer is torn down and every later call returns
    /// [`WriteError::Aborted`]; bytes already returned are an incomplete
    /// stream.
    pub fn next_chunk(&mut self, out: &mut [u8]) -> Result<usize, WriteError> {
        if self.failed {
            return Err(WriteError::Aborted);
        }
        if out.is_empty() {
            return Err(WriteError::EmptyBuffer);
        }
        let mut written = 0;
        loop {
            written += self.pending.drain_into(&mut out[written..]);
            if written == out.len() || self.frames.is_empty() {
                return Ok(written);
            }
            if let Err(err) = self.step() {
                self.abort();
                log::debug!("write failed: {err}");
                return Err(err);
            }
        }
    }

    fn abort(&mut self) {
        self.frames = Vec::new();
        self.pending = ByteBuffer::new();
        self.failed = true;
    }

    /// Advance the top frame by one state, staging its text.
    fn step(&mut self) -> Result<(), WriteError> {
        let document = self.document;
        let Some(mut frame) = self.frames.last().copied() else {
            return Ok(());
        };
        let object = document
            .object(frame.object)
            .ok_or(WriteError::UnknownObject)?;

        match frame.state {
            FrameState::Begin => {
                self.emit(b"BEGIN:")?;
                self.emit(object.kind())?;
                self.emit(CRLF)?;
                frame.state = FrameState::Name;
            }
            FrameState::Name => match property_at(document, object, frame.property)? {
                None => frame.state = FrameState::End,
                Some(property) => {
                    if !matches!(property.value(), Value::Object(_)) {
                        self.emit_name(property)?;
                    }
                    frame.state = FrameState::Value;
                }
            },
            FrameState::Value => {
                let property = property_at(document, object, frame.property)?
                    .ok_or(WriteError::UnknownProperty)?;
                match property.value() {
                    Value::Object(child) => {
                        log::trace!("push frame at depth {}", self.frames.len());
                        self.frames.try_reserve(1)?;
                        self.frames.push(Frame::new(*child));
                        return Ok(());
                    }
                    Value::Text(strings) => {
                        self.emit_text(strings)?;
                        self.emit(CRLF)?;
                        frame.next_property();
                    }
                    Value::QuotedPrintable(strings) => {
                        self.emit_quoted_printable(strings)?;
                        self.emit(CRLF)?;
                        frame.next_property();
                    }
                    Value::EightBit(_) => {
                        return Err(WriteError::UnsupportedEncoding(Encoding::EightBit));
                    }
                    Value::Base64(bytes) => {
                        if frame.offset < bytes.len() {
                            let end = bytes
                                .len()
                                .min(frame.offset + base64::bytes_per_line(self.options.base64_line_width));
                            self.emit_base64_line(&bytes[frame.offset..end])?;
                            frame.offset = end;
                        } else {
                            self.emit(CRLF)?;
                            frame.next_property();
                        }
                    }
                }
            }
            FrameState::End => {
                self.emit(b"END:")?;
                self.emit(object.kind())?;
                self.emit(CRLF)?;
                frame.state = FrameState::Done;
            }
            FrameState::Done => {
                let sibling = match self.options.scope {
                    WriteScope::Siblings if self.frames.len() == 1 => object.next(),
                    _ => None,
                };
                if let Some(sibling) = sibling {
                    frame = Frame::new(sibling);
                } else {
                    self.frames.pop();
                    log::trace!("pop frame for {}", object.kind());
                    if let Some(parent) = self.frames.last_mut() {
                        parent.next_property();
                    }
                    return Ok(());
                }
            }
        }

        if let Some(top) = self.frames.last_mut() {
            *top = frame;
        }
        Ok(())
    }

    /// Stage `bytes`, keeping track of the output column.
    fn emit(&mut self, bytes: &[u8]) -> Result<(), WriteError> {
        self.pending.extend(bytes)?;
        self.column = match bytes.iter().rposition(|&b| b == b'\n') {
            Some(newline) => bytes.len() - newline - 1,
            None => self.column + bytes.len(),
        };
        Ok(())
    }

    fn emit_name(&mut self, property: &Property) -> Result<(), WriteError> {
        if let Some(group) = property.group() {
            self.emit_name_token(group)?;
            self.emit(b".")?;
        }
        for (i, token) in property.name().iter().enumerate() {
            if i > 0 {
                self.emit(b";")?;
            }
            self.emit_name_token(token.map(|t| &**t).unwrap_or_default())?;
        }
        self.emit(b":")
    }

    /// A `;` inside a token is escaped so it does not start a new
    /// qualifier.
    fn emit_name_token(&mut self, token: &[u8]) -> Result<(), WriteError> {
        reject(token, is_name_break)?;
        let mut parts = token.split(|&b| b == b';');
        if let Some(first) = parts.next() {
            self.emit(first)?;
        }
        for part in parts {
            self.emit(b"\\;")?;
            self.emit(part)?;
        }
        Ok(())
    }

    fn emit_text(&mut self, strings: &StringList) -> Result<(), WriteError> {
        for (i, string) in strings.iter().enumerate() {
            if i > 0 {
                self.emit_folded(b";")?;
            }
            let string = string.map(|s| &**s).unwrap_or_default();
            reject(string, |b| is_line_end(b) || b == b';')?;
            self.emit_folded(string)?;
        }
        Ok(())
    }

    /// Stage plain text, folding long lines. A fold never separates a
    /// UTF-8 continuation byte from the bytes before it.
    fn emit_folded(&mut self, text: &[u8]) -> Result<(), WriteError> {
        let Some(width) = self.options.fold_width else {
            return self.emit(text);
        };
        for &byte in text {
            if self.column >= width && !is_continuation(byte) {
                self.emit(FOLD)?;
            }
            self.emit(&[byte])?;
        }
        Ok(())
    }

    fn emit_quoted_printable(&mut self, strings: &StringList) -> Result<(), WriteError> {
        let mut encoded = Vec::new();
        for (i, string) in strings.iter().enumerate() {
            if i > 0 {
                self.emit(b";")?;
            }
            if let Some(string) = string {
                encoded.clear();
                Encoder::new(self.column, self.options.quoted_printable_line_width)
                    .push_all(string, &mut encoded)?;
                self.emit(&encoded)?;
            }
        }
        Ok(())
    }

    fn emit_base64_line(&mut self, line: &[u8]) -> Result<(), WriteError> {
        let mut encoded = Vec::new();
        base64::encode_into(line, &mut encoded)?;
        self.emit(base64::LINE_PREFIX)?;
        self.emit(&encoded)
    }
}

fn is_line_end(byte: u8) -> bool {
    byte == b'\r' || byte == b'\n'
}

/// Bytes that would end a name early; only `;` has an escape.
fn is_name_break(byte: u8) -> bool {
    is_line_end(byte) || byte == b':' || byte == b'\\'
}

fn reject(text: &[u8], unwritable: impl Fn(u8) -> bool) -> Result<(), WriteError> {
    match text.iter().find(|&&b| unwritable(b)) {
        Some(&byte) => Err(WriteError::UnwritableByte(byte)),
        None => Ok(()),
    }
}

fn is_continuation(byte: u8) -> bool {
    (0x80..=0xbf).contains(&byte)
}

fn property_at<'d>(
    document: &'d Document,
    object: &Object,
    index: usize,
) -> Result<Option<&'d Property>, WriteError> {
    match object.properties().get(index) {
        None => Ok(None),
        Some(&id) => document
            .property(id)
            .map(Some)
            .ok_or(WriteError::UnknownProperty),
    }
}

/// Write `object` (and, depending on `options`, its later siblings) into a
/// new vector.
///
/// # Errors
///
/// See [`Writer::next_chunk`].
pub fn write_to_vec(
    document: &Document,
    object: ObjectId,
    options: WriterOptions,
) -> Result<Vec<u8>, WriteError> {
    let mut writer = Writer::new(document, object, options);
    let mut out = Vec::new();
    let mut chunk = [0u8; CHUNK_SIZE];
    loop {
        let n = writer.next_chunk(&mut chunk)?;
        if n == 0 {
            return Ok(out);
        }
        out.try_reserve(n)?;
        out.extend_from_slice(&chunk[..n]);
    }
}
