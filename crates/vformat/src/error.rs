use alloc::collections::TryReserveError;

use thiserror::Error;

use crate::tree::Encoding;

/// A failure reported by [`Parser::feed`](crate::Parser::feed) or
/// [`Parser::finish`](crate::Parser::finish).
///
/// The position is the 1-based line and column of the byte that triggered
/// the failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at {line}:{column}")]
pub struct ParseError {
    pub(crate) kind: ParseErrorKind,
    pub(crate) line: usize,
    pub(crate) column: usize,
}

impl ParseError {
    /// What went wrong.
    #[must_use]
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    /// Line of the offending byte, starting at 1.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line
    }

    /// Column of the offending byte, starting at 1.
    #[must_use]
    pub fn column(&self) -> usize {
        self.column
    }
}

/// The cause of a [`ParseError`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// The input violates the property grammar.
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),
    /// A buffer or tree node could not be grown.
    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),
    /// A tree operation failed while a parsed value was committed.
    #[error("tree error: {0}")]
    Access(#[from] AccessError),
}

/// Illegal input for the state the parser was in.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxError {
    /// Only `\;` may be escaped inside a property name.
    #[error("invalid escape '\\{}' in property name", printable(.0))]
    InvalidNameEscape(u8),
    /// A quoted-printable `=` was followed by something other than two hex
    /// digits or a line break.
    #[error("invalid quoted-printable digit {:?}", printable(.0))]
    InvalidQuotedPrintableDigit(u8),
}

fn printable(byte: &u8) -> char {
    char::from(*byte)
}

/// A failure reported by [`Writer::next_chunk`](crate::Writer::next_chunk).
///
/// Bytes already handed out stay valid but the stream is incomplete; the
/// writer refuses any further work.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WriteError {
    /// The value encoding has no wire form.
    #[error("cannot write a {0} value")]
    UnsupportedEncoding(Encoding),
    /// A name, group or text value holds a byte that has no escape there,
    /// such as a line break. Written as is, it would end the property early
    /// or split the value.
    #[error("{:?} cannot be written here", printable(.0))]
    UnwritableByte(u8),
    /// The destination buffer has no room.
    #[error("destination buffer is empty")]
    EmptyBuffer,
    /// An object handle does not refer to a live object.
    #[error("unknown object")]
    UnknownObject,
    /// A property handle does not refer to a live property.
    #[error("unknown property")]
    UnknownProperty,
    /// The pending-text cache or the frame stack could not be grown.
    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),
    /// A previous call failed.
    #[error("writer already failed")]
    Aborted,
}

/// A failure of a tree mutation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// An object handle does not refer to a live object.
    #[error("unknown object")]
    UnknownObject,
    /// A property handle does not refer to a live property.
    #[error("unknown property")]
    UnknownProperty,
    /// A string index lies too far beyond the end of the list.
    #[error("index {index} out of range for a list of {len} strings")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Length of the list at the time of the request.
        len: usize,
    },
    /// The object would end up nested inside itself.
    #[error("object would contain itself")]
    WouldCreateCycle,
    /// The object is already a root or the value of a property.
    #[error("object is already attached")]
    AlreadyAttached,
    /// The operation cannot produce a value in this encoding.
    #[error("cannot store a {0} value this way")]
    UnsupportedEncoding(Encoding),
    /// A node or string could not be allocated.
    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),
}

/// Why a string is not a valid [`Period`](crate::Period).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodError {
    /// Periods start with `P`.
    #[error("period must start with 'P'")]
    MissingPrefix,
    /// Nothing follows the `P`.
    #[error("empty period")]
    Empty,
    /// A number is not followed by `Y`, `M`, `W`, `D`, `H` or `S`.
    #[error("number without a designator at the end of the period")]
    MissingDesignator,
    /// The `T` marker appears twice.
    #[error("repeated 'T' in period")]
    RepeatedTimeMarker,
    /// A byte that is neither a digit nor a designator.
    #[error("unexpected {:?} in period", printable(.0))]
    UnexpectedByte(u8),
    /// A number does not fit in 32 bits.
    #[error("period field overflows")]
    Overflow,
}

/// Why a string is not a valid [`DateTime`](crate::DateTime).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeError {
    /// Not `YYYYMMDD`, `YYYYMMDDTHHMMSS` or `YYYYMMDDTHHMMSSZ`.
    #[error("expected YYYYMMDD or YYYYMMDDTHHMMSS[Z]")]
    InvalidFormat,
    /// A field is outside its calendar range.
    #[error("{0} out of range")]
    OutOfRange(&'static str),
}

/// A failure of the `std::io` adapters.
#[cfg(feature = "std")]
#[derive(Error, Debug)]
pub enum StreamError {
    /// Reading or writing the underlying stream failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The input could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The tree could not be written.
    #[error(transparent)]
    Write(#[from] WriteError),
    /// A tree mutation failed.
    #[error(transparent)]
    Access(#[from] AccessError),
}
