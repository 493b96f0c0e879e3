use crate::codec::{base64, quoted_printable};

/// Configuration for [`Parser`](crate::Parser).
///
/// # Default
///
/// All options default to `false`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserOptions {
    #[cfg(any(test, feature = "fuzzing"))]
    /// Panic on syntax errors instead of returning them.
    ///
    /// Enabled only in test and fuzzing builds to get a backtrace at the
    /// failing byte.
    pub panic_on_error: bool,
}

/// Which objects a [`Writer`](crate::Writer) emits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteScope {
    /// Only the object the writer was started with.
    #[default]
    Object,
    /// The starting object and every later object in the top-level
    /// sibling chain, as in a multi-entry address book file.
    Siblings,
}

/// Configuration for [`Writer`](crate::Writer).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    /// Which objects to write.
    ///
    /// Nested objects are always written in full; this only decides
    /// whether the top-level sibling chain is followed.
    ///
    /// # Default
    ///
    /// [`WriteScope::Object`]
    pub scope: WriteScope,

    /// Fold plain-text values once a line reaches this many bytes.
    ///
    /// A fold is a CRLF followed by a single space, which the parser
    /// removes again. `None` writes every value on one line.
    ///
    /// # Default
    ///
    /// `Some(75)`
    pub fold_width: Option<usize>,

    /// Encoded characters per BASE64 line.
    ///
    /// Rounded down to a whole number of four-character groups, with a
    /// minimum of one group.
    ///
    /// # Default
    ///
    /// `64`
    pub base64_line_width: usize,

    /// Longest quoted-printable line, soft break included.
    ///
    /// # Default
    ///
    /// `76`
    pub quoted_printable_line_width: usize,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            scope: WriteScope::Object,
            fold_width: Some(75),
            base64_line_width: base64::DEFAULT_LINE_WIDTH,
            quoted_printable_line_width: quoted_printable::MAX_LINE_LENGTH,
        }
    }
}
