//! Value transfer encodings.

pub mod base64;
pub mod quoted_printable;
