//! Incremental parser and writer for vCard and vCalendar objects.
//!
//! Text goes into a [`Parser`] in chunks of any size and comes out as a
//! [`Document`]: an arena of objects (`BEGIN:VCARD` … `END:VCARD`) holding
//! properties, which in turn hold text, quoted-printable, BASE64 or 8-bit
//! values, or further nested objects. A [`Writer`] turns a tree back into
//! text, again in caller-sized chunks.
//!
//! ```
//! use vformat::{Encoding, Parser, ParserOptions, PropertyQuery, WriterOptions};
//!
//! let mut parser = Parser::new(ParserOptions::default());
//! parser.feed(b"BEGIN:VCARD\r\nTEL;WORK:555-12").unwrap();
//! parser.feed(b"34\r\nEND:VCARD\r\n").unwrap();
//! let mut doc = parser.finish().unwrap();
//!
//! let card = doc.root().unwrap();
//! let tel = doc.find_property(card, PropertyQuery::new("tel")).unwrap();
//! assert_eq!(doc.property(tel).unwrap().value_string(0).unwrap(), "555-1234");
//!
//! let note = doc.append_property(card).unwrap();
//! doc.set_name_string(note, 0, "NOTE").unwrap();
//! doc.set_value_bytes(note, "café".as_bytes(), Encoding::QuotedPrintable).unwrap();
//!
//! let out = vformat::write_to_vec(&doc, card, WriterOptions::default()).unwrap();
//! assert_eq!(
//!     out,
//!     b"BEGIN:VCARD\r\nTEL;WORK:555-1234\r\nNOTE;QUOTED-PRINTABLE:caf=C3=A9\r\nEND:VCARD\r\n"
//! );
//! ```

#![no_std]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod byte_buffer;
mod calendar;
pub mod chunk_utils;
pub mod codec;
mod error;
#[cfg(feature = "std")]
mod io;
mod options;
mod parser;
mod string_list;
mod tree;
mod writer;

#[cfg(test)]
mod tests;

pub use calendar::{DateTime, Period};
#[cfg(feature = "std")]
pub use error::StreamError;
pub use error::{
    AccessError, DateTimeError, ParseError, ParseErrorKind, PeriodError, SyntaxError, WriteError,
};
#[cfg(feature = "std")]
pub use io::{
    READ_CHUNK_SIZE, WRITE_CHUNK_SIZE, read_file, read_from, set_property_from_file, write_file,
    write_to, write_with,
};
pub use options::{ParserOptions, WriteScope, WriterOptions};
pub use parser::{Parser, parse};
pub use string_list::{MAX_INCREMENT, StringList};
pub use tree::{Document, Encoding, Object, ObjectId, Property, PropertyId, PropertyQuery, Value};
pub use writer::{Writer, write_to_vec};

/// Wildcard accepted by [`PropertyQuery`] in place of a group, a name or a
/// qualifier.
pub use tree::ANY;
