//! Adapters between the chunked parser/writer and `std::io`.

use std::{
    fs::File,
    io::{self, BufWriter, Read, Write},
    path::Path,
    vec::Vec,
};

use crate::{
    error::{AccessError, StreamError},
    options::{ParserOptions, WriterOptions},
    parser::Parser,
    tree::{Document, Encoding, ObjectId, PropertyId},
    writer::Writer,
};

/// Bytes read per [`Parser::feed`] call.
pub const READ_CHUNK_SIZE: usize = 1024;

/// Output buffer used by [`write_to`] and [`write_file`].
pub const WRITE_CHUNK_SIZE: usize = 1024;

/// Parse everything `reader` yields.
///
/// # Errors
///
/// Returns the first I/O or parse error.
pub fn read_from(mut reader: impl Read) -> Result<Document, StreamError> {
    let mut parser = Parser::new(ParserOptions::default());
    let mut buf = [0u8; READ_CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        parser.feed(&buf[..n])?;
    }
    Ok(parser.finish()?)
}

/// Parse the file at `path`.
///
/// # Errors
///
/// As for [`read_from`], plus failure to open the file.
pub fn read_file(path: impl AsRef<Path>) -> Result<Document, StreamError> {
    read_from(File::open(path)?)
}

/// Drive a [`Writer`] with a `buffer_size` scratch buffer, passing each
/// filled chunk to `sink`. Stops at the first error from either side.
///
/// # Errors
///
/// Returns the writer's error or the first error from `sink`.
pub fn write_with(
    document: &Document,
    object: ObjectId,
    options: WriterOptions,
    buffer_size: usize,
    mut sink: impl FnMut(&[u8]) -> io::Result<()>,
) -> Result<(), StreamError> {
    let mut writer = Writer::new(document, object, options);
    let mut buf = Vec::new();
    buf.try_reserve_exact(buffer_size)
        .map_err(crate::error::WriteError::from)?;
    buf.resize(buffer_size, 0);
    loop {
        let n = writer.next_chunk(&mut buf)?;
        if n == 0 {
            return Ok(());
        }
        sink(&buf[..n])?;
    }
}

/// Write `object` to `out`.
///
/// # Errors
///
/// As for [`write_with`].
pub fn write_to(
    document: &Document,
    object: ObjectId,
    options: WriterOptions,
    mut out: impl Write,
) -> Result<(), StreamError> {
    write_with(document, object, options, WRITE_CHUNK_SIZE, |chunk| {
        out.write_all(chunk)
    })?;
    Ok(out.flush()?)
}

/// Write `object` to a new file at `path`, replacing any existing file.
///
/// # Errors
///
/// As for [`write_with`], plus failure to create the file. A partially
/// written file is left behind on error.
pub fn write_file(
    document: &Document,
    object: ObjectId,
    options: WriterOptions,
    path: impl AsRef<Path>,
) -> Result<(), StreamError> {
    let file = BufWriter::new(File::create(path)?);
    write_to(document, object, options, file)
}

/// Replace the value of `property` with the contents of the file at
/// `path`, stored in `encoding`.
///
/// # Errors
///
/// Fails if the file cannot be read or the value cannot be stored; see
/// [`Document::set_value_bytes`].
pub fn set_property_from_file(
    document: &mut Document,
    property: PropertyId,
    encoding: Encoding,
    path: impl AsRef<Path>,
) -> Result<(), StreamError> {
    document
        .property(property)
        .ok_or(AccessError::UnknownProperty)?;
    let bytes = std::fs::read(path)?;
    Ok(document.set_value_bytes(property, &bytes, encoding)?)
}
