//! Append-only byte buffer with a read cursor.
//!
//! The writer formats a whole token (a name, one escaped value string, one
//! wrapped BASE64 line) at a time into a [`ByteBuffer`] and then hands out
//! as much of it as fits in each destination chunk. The parser uses it to
//! hold a BASE64 line until the line ends.

use alloc::{collections::TryReserveError, vec::Vec};

#[derive(Debug, Default, Clone)]
pub(crate) struct ByteBuffer {
    data: Vec<u8>,
    read: usize,
}

impl ByteBuffer {
    pub(crate) const fn new() -> Self {
        Self {
            data: Vec::new(),
            read: 0,
        }
    }

    /// Unread bytes.
    pub(crate) fn as_slice(&self) -> &[u8] {
        &self.data[self.read..]
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.read == self.data.len()
    }

    pub(crate) fn push(&mut self, byte: u8) -> Result<(), TryReserveError> {
        self.compact();
        self.data.try_reserve(1)?;
        self.data.push(byte);
        Ok(())
    }

    pub(crate) fn extend(&mut self, bytes: &[u8]) -> Result<(), TryReserveError> {
        self.compact();
        self.data.try_reserve(bytes.len())?;
        self.data.extend_from_slice(bytes);
        Ok(())
    }

    /// Copy as many unread bytes as fit into `out`, returning the count.
    pub(crate) fn drain_into(&mut self, out: &mut [u8]) -> usize {
        let pending = &self.data[self.read..];
        let n = pending.len().min(out.len());
        out[..n].copy_from_slice(&pending[..n]);
        self.read += n;
        if self.is_empty() {
            self.clear();
        }
        n
    }

    /// Remove and return every unread byte.
    pub(crate) fn take(&mut self) -> Vec<u8> {
        let mut data = core::mem::take(&mut self.data);
        data.drain(..self.read);
        self.read = 0;
        data
    }

    pub(crate) fn clear(&mut self) {
        self.data.clear();
        self.read = 0;
    }

    // Reclaim the consumed prefix once it dominates the allocation.
    fn compact(&mut self) {
        if self.read > 0 && self.read * 2 >= self.data.len() {
            self.data.drain(..self.read);
            self.read = 0;
        }
    }
}
