//! BASE64 as it appears in vCard 2.1 and vCalendar 1.0 values.
//!
//! Decoding is lenient: whitespace is skipped, characters outside the
//! alphabet decode as zero bits, and a trailing partial quantum yields as
//! many whole bytes as its non-`=` characters carry (`6 × count / 8`).
//! Encoding wraps lines the way the writer emits them: every line starts
//! with CRLF and a four-space indent.

use alloc::{collections::TryReserveError, vec::Vec};

use ::base64::{
    Engine, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
};

/// Encoded characters per wrapped line unless configured otherwise.
pub const DEFAULT_LINE_WIDTH: usize = 64;

pub(crate) const LINE_PREFIX: &[u8] = b"\r\n    ";

/// Padded on output; padding optional and stray low bits ignored on input.
const ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_encode_padding(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

fn sanitize(c: u8) -> u8 {
    if c.is_ascii_alphanumeric() || matches!(c, b'+' | b'/' | b'=') {
        c
    } else {
        b'A'
    }
}

/// Incremental decoder carrying the characters of a partial quantum
/// between calls.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Decoder {
    carry: [u8; 4],
    len: usize,
}

impl Decoder {
    /// A decoder with no buffered characters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            carry: [0; 4],
            len: 0,
        }
    }

    /// `true` when no partial quantum is buffered.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.len == 0
    }

    /// Decode `input`, appending complete bytes to `out`.
    ///
    /// # Errors
    ///
    /// Fails if `out` cannot grow.
    pub fn decode(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<(), TryReserveError> {
        out.try_reserve(input.len() / 4 * 3 + 3)?;
        for &c in input {
            if c.is_ascii_whitespace() {
                continue;
            }
            self.carry[self.len] = sanitize(c);
            self.len += 1;
            if self.len == 4 {
                self.flush(out);
            }
        }
        Ok(())
    }

    /// Decode whatever partial quantum is left.
    ///
    /// # Errors
    ///
    /// Fails if `out` cannot grow.
    pub fn finish(&mut self, out: &mut Vec<u8>) -> Result<(), TryReserveError> {
        if self.len > 0 {
            out.try_reserve(3)?;
            self.flush(out);
        }
        Ok(())
    }

    /// Decode the carried quantum. `=` only counts towards the quantum
    /// boundary, so `TWE=TWFu` is two quanta.
    fn flush(&mut self, out: &mut Vec<u8>) {
        let mut chars = [0u8; 4];
        let mut n = 0;
        for &c in &self.carry[..self.len] {
            if c != b'=' {
                chars[n] = c;
                n += 1;
            }
        }
        self.len = 0;
        // A lone character carries less than a byte.
        if n < 2 {
            return;
        }
        let mut bytes = [0u8; 3];
        // Sanitized, unpadded, with trailing bits allowed: always decodes.
        if let Ok(len) = ENGINE.decode_slice(&chars[..n], &mut bytes) {
            out.extend_from_slice(&bytes[..len]);
        }
    }
}

/// Decode a complete BASE64 text.
///
/// # Errors
///
/// Fails if the output cannot be allocated.
pub fn decode(input: &[u8]) -> Result<Vec<u8>, TryReserveError> {
    let mut out = Vec::new();
    let mut decoder = Decoder::new();
    decoder.decode(input, &mut out)?;
    decoder.finish(&mut out)?;
    Ok(out)
}

/// Append the unwrapped, padded encoding of `bytes` to `out`.
///
/// # Errors
///
/// Fails if `out` cannot grow.
pub fn encode_into(bytes: &[u8], out: &mut Vec<u8>) -> Result<(), TryReserveError> {
    let len = ::base64::encoded_len(bytes.len(), true).unwrap_or(usize::MAX);
    out.try_reserve(len)?;
    let start = out.len();
    out.resize(start + len, 0);
    let written = ENGINE.encode_slice(bytes, &mut out[start..]).unwrap_or(0);
    out.truncate(start + written);
    Ok(())
}

/// Encode `bytes` without line wrapping.
///
/// # Errors
///
/// Fails if the output cannot be allocated.
pub fn encode(bytes: &[u8]) -> Result<Vec<u8>, TryReserveError> {
    let mut out = Vec::new();
    encode_into(bytes, &mut out)?;
    Ok(out)
}

/// Input bytes that fill one wrapped line of `line_width` characters.
pub(crate) fn bytes_per_line(line_width: usize) -> usize {
    (line_width / 4).max(1) * 3
}

/// Encode `bytes` in the wrapped form used on the wire: each line of at
/// most `line_width` characters is introduced by CRLF and four spaces.
///
/// # Errors
///
/// Fails if the output cannot be allocated.
pub fn encode_wrapped(bytes: &[u8], line_width: usize) -> Result<Vec<u8>, TryReserveError> {
    let mut out = Vec::new();
    for line in bytes.chunks(bytes_per_line(line_width)) {
        out.try_reserve(LINE_PREFIX.len())?;
        out.extend_from_slice(LINE_PREFIX);
        encode_into(line, &mut out)?;
    }
    Ok(out)
}
