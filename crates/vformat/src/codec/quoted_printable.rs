//! Quoted-printable values.
//!
//! The decoder is a byte-at-a-time state machine so the parser can stop in
//! the middle of an escape at a chunk boundary. The encoder escapes every
//! byte outside a small unreserved set and inserts `=` CRLF soft breaks to
//! keep lines short.

use alloc::{collections::TryReserveError, vec::Vec};

use crate::error::SyntaxError;

/// Longest encoded line, soft break included.
pub const MAX_LINE_LENGTH: usize = 76;

pub(crate) const SOFT_BREAK: &[u8] = b"=\r\n";

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Whether `byte` must be written as `=XX`.
#[must_use]
pub fn needs_escape(byte: u8) -> bool {
    !(byte.is_ascii_alphanumeric() || matches!(byte, b' ' | b',' | b'-' | b'.' | b'!' | b'?' | b'\''))
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}

/// Where the decoder is within the encoded text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeState {
    /// Plain characters.
    #[default]
    Idle,
    /// Just after `=` CR; the LF completing the soft break is swallowed.
    IdleAfterNewline,
    /// After `=`, waiting for the first hex digit or a line break.
    Digit1,
    /// After `=` and one hex digit (the high nibble).
    Digit2(u8),
}

/// What one input byte meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoded {
    /// Nothing to emit yet.
    Consumed,
    /// A decoded data byte.
    Byte(u8),
    /// An unescaped `;`: the next string of the value starts.
    Separator,
    /// An unescaped CR or LF: the value is complete.
    LineEnd,
}

impl DecodeState {
    /// Advance by one input byte.
    ///
    /// # Errors
    ///
    /// [`SyntaxError::InvalidQuotedPrintableDigit`] when an escape holds a
    /// byte that is neither a hex digit nor (directly after `=`) a line
    /// break.
    pub fn step(self, c: u8) -> Result<(Self, Decoded), SyntaxError> {
        let is_line_end = c == b'\r' || c == b'\n';
        Ok(match self {
            Self::IdleAfterNewline if c == b'\n' => (Self::Idle, Decoded::Consumed),
            Self::Idle | Self::IdleAfterNewline => match c {
                b'=' => (Self::Digit1, Decoded::Consumed),
                b';' => (Self::Idle, Decoded::Separator),
                _ if is_line_end => (Self::Idle, Decoded::LineEnd),
                _ => (Self::Idle, Decoded::Byte(c)),
            },
            Self::Digit1 if is_line_end => (Self::IdleAfterNewline, Decoded::Consumed),
            Self::Digit1 => {
                let high = hex_value(c).ok_or(SyntaxError::InvalidQuotedPrintableDigit(c))?;
                (Self::Digit2(high), Decoded::Consumed)
            }
            Self::Digit2(high) => {
                let low = hex_value(c).ok_or(SyntaxError::InvalidQuotedPrintableDigit(c))?;
                (Self::Idle, Decoded::Byte((high << 4) | low))
            }
        })
    }
}

/// Decode a quoted-printable text in one go.
///
/// Separators and bare line ends are kept as data; soft breaks are removed.
///
/// # Errors
///
/// Fails on a malformed escape.
pub fn decode(input: &[u8]) -> Result<Vec<u8>, SyntaxError> {
    let mut out = Vec::with_capacity(input.len());
    let mut state = DecodeState::Idle;
    for &c in input {
        let (next, decoded) = state.step(c)?;
        state = next;
        match decoded {
            Decoded::Consumed => {}
            Decoded::Byte(b) => out.push(b),
            Decoded::Separator | Decoded::LineEnd => out.push(c),
        }
    }
    Ok(out)
}

/// Line-length aware encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Encoder {
    column: usize,
    max_line: usize,
}

impl Encoder {
    /// Start at `column` on the current line, breaking before a line would
    /// grow past `max_line` bytes.
    #[must_use]
    pub const fn new(column: usize, max_line: usize) -> Self {
        Self { column, max_line }
    }

    /// Column after everything encoded so far.
    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }

    /// Encode one byte onto `out`.
    ///
    /// # Errors
    ///
    /// Fails if `out` cannot grow.
    pub fn push(&mut self, byte: u8, out: &mut Vec<u8>) -> Result<(), TryReserveError> {
        out.try_reserve(2 * SOFT_BREAK.len() + 3)?;
        if self.column + 3 > self.max_line {
            out.extend_from_slice(SOFT_BREAK);
            self.column = 0;
        }
        if needs_escape(byte) {
            out.extend_from_slice(&[b'=', HEX[usize::from(byte >> 4)], HEX[usize::from(byte & 0xf)]]);
            self.column += 3;
            if byte == b'\r' {
                out.extend_from_slice(SOFT_BREAK);
                self.column = 0;
            }
        } else {
            out.push(byte);
            self.column += 1;
        }
        Ok(())
    }

    /// Encode every byte of `bytes` onto `out`.
    ///
    /// # Errors
    ///
    /// Fails if `out` cannot grow.
    pub fn push_all(&mut self, bytes: &[u8], out: &mut Vec<u8>) -> Result<(), TryReserveError> {
        bytes.iter().try_for_each(|&b| self.push(b, out))
    }
}

/// Encode `input` starting at column zero with the default line length.
///
/// # Errors
///
/// Fails if the output cannot be allocated.
pub fn encode(input: &[u8]) -> Result<Vec<u8>, TryReserveError> {
    let mut out = Vec::new();
    Encoder::new(0, MAX_LINE_LENGTH).push_all(input, &mut out)?;
    Ok(out)
}
