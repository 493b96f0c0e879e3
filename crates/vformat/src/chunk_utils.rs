//! Helpers for splitting input into chunks, used by tests, benches and
//! the fuzz target.

use alloc::vec::Vec;

/// Split `payload` into `parts` chunks of roughly equal size. The last
/// chunk may be shorter; an empty payload yields no chunks.
///
/// # Panics
///
/// Panics if `parts` is zero.
#[must_use]
pub fn produce_chunks(payload: &[u8], parts: usize) -> Vec<&[u8]> {
    assert!(parts > 0);
    let chunk_size = payload.len().div_ceil(parts).max(1);
    payload.chunks(chunk_size).collect()
}

/// Split `payload` at the positions given by `splits`, each taken modulo
/// the length still remaining, so any list of numbers yields a valid
/// partition. Whatever is left after the last split becomes the final
/// chunk.
#[must_use]
pub fn split_at_offsets<'a>(payload: &'a [u8], splits: &[usize]) -> Vec<&'a [u8]> {
    let mut chunks = Vec::new();
    let mut rest = payload;
    for &split in splits {
        if rest.is_empty() {
            break;
        }
        let (head, tail) = rest.split_at(1 + split % rest.len());
        chunks.push(head);
        rest = tail;
    }
    if !rest.is_empty() {
        chunks.push(rest);
    }
    chunks
}
