//! Ordered lists of optional byte strings.
//!
//! Property names and text values are both sequences of `;`-separated
//! tokens where any slot may be absent (`TEL;;PREF` has an empty middle
//! qualifier). Indices into a [`StringList`] are stable: writing past the
//! end grows the list and fills the gap with absent entries, but only by a
//! bounded amount so a stray index cannot balloon the allocation.

use alloc::{collections::TryReserveError, vec::Vec};

use bstr::{BStr, BString, ByteSlice};

use crate::error::AccessError;

/// How far past the current end [`StringList::set`] may reach.
pub const MAX_INCREMENT: usize = 5;

/// An ordered list of optional byte strings with stable indices.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct StringList {
    entries: Vec<Option<BString>>,
}

impl StringList {
    /// An empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of slots, present or absent.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if the list has no slots at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The string at `index`, or `None` when the slot is absent or out of
    /// range.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&BStr> {
        self.entries.get(index)?.as_ref().map(|s| s.as_bstr())
    }

    /// Iterate over all slots in order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Option<&BStr>> + '_ {
        self.entries.iter().map(|e| e.as_ref().map(|s| s.as_bstr()))
    }

    /// Append a slot.
    ///
    /// # Errors
    ///
    /// Fails if the list or the string cannot be allocated.
    pub fn push(&mut self, entry: Option<&[u8]>) -> Result<(), TryReserveError> {
        let entry = match entry {
            Some(bytes) => Some(owned(bytes)?),
            None => None,
        };
        self.entries.try_reserve(1)?;
        self.entries.push(entry);
        Ok(())
    }

    /// Store `entry` at `index`, growing the list by at most
    /// [`MAX_INCREMENT`] slots. Returns whether the slot changed.
    ///
    /// # Errors
    ///
    /// [`AccessError::IndexOutOfRange`] when `index` lies further than
    /// [`MAX_INCREMENT`] past the end, or an allocation failure.
    pub fn set(&mut self, index: usize, entry: Option<&[u8]>) -> Result<bool, AccessError> {
        let len = self.entries.len();
        if index >= len + MAX_INCREMENT {
            return Err(AccessError::IndexOutOfRange { index, len });
        }
        if index < len && self.entries[index].as_ref().map(|s| s.as_slice()) == entry {
            return Ok(false);
        }
        let entry = match entry {
            Some(bytes) => Some(owned(bytes)?),
            None => None,
        };
        if index >= len {
            self.entries.try_reserve(index + 1 - len)?;
            self.entries.resize(index + 1, None);
        }
        self.entries[index] = entry;
        Ok(true)
    }

    /// Remove the slot at `index`, shifting later slots down.
    pub fn remove(&mut self, index: usize) -> Option<BString> {
        if index < self.entries.len() {
            self.entries.remove(index)
        } else {
            None
        }
    }

    /// Take the string out of slot `index`, leaving it absent.
    pub fn take(&mut self, index: usize) -> Option<BString> {
        self.entries.get_mut(index)?.take()
    }

    /// Drop every slot.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Index of the first present entry equal to `needle`, ignoring ASCII
    /// case.
    #[must_use]
    pub fn position(&self, needle: &[u8]) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.as_ref().is_some_and(|s| s.eq_ignore_ascii_case(needle)))
    }

    /// Index of the first present entry that contains `needle` anywhere,
    /// ignoring ASCII case.
    #[must_use]
    pub fn position_containing(&self, needle: &[u8]) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.as_ref().is_some_and(|s| contains_ignore_case(s, needle)))
    }

    /// Extend the last slot with `bytes`, creating it when the list is
    /// empty or the last slot is absent.
    pub(crate) fn append_to_last(&mut self, bytes: &[u8]) -> Result<(), TryReserveError> {
        if self.entries.is_empty() {
            self.entries.try_reserve(1)?;
            self.entries.push(None);
        }
        let last = self.entries.len() - 1;
        match &mut self.entries[last] {
            Some(s) => {
                s.try_reserve(bytes.len())?;
                s.extend_from_slice(bytes);
            }
            slot @ None => *slot = Some(owned(bytes)?),
        }
        Ok(())
    }

    pub(crate) fn try_clone(&self) -> Result<Self, TryReserveError> {
        let mut entries = Vec::new();
        entries.try_reserve(self.entries.len())?;
        for entry in &self.entries {
            entries.push(match entry {
                Some(s) => Some(owned(s)?),
                None => None,
            });
        }
        Ok(Self { entries })
    }
}

impl<'a> FromIterator<Option<&'a str>> for StringList {
    fn from_iter<I: IntoIterator<Item = Option<&'a str>>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|e| e.map(BString::from)).collect(),
        }
    }
}

impl<'a> FromIterator<&'a str> for StringList {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(Some).collect()
    }
}

pub(crate) fn owned(bytes: &[u8]) -> Result<BString, TryReserveError> {
    let mut v = Vec::new();
    v.try_reserve_exact(bytes.len())?;
    v.extend_from_slice(bytes);
    Ok(BString::from(v))
}

pub(crate) fn contains_ignore_case(haystack: &[u8], needle: &[u8]) -> bool {
    needle.is_empty()
        || haystack
            .windows(needle.len())
            .any(|w| w.eq_ignore_ascii_case(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_grows_with_absent_slots() {
        let mut list: StringList = ["TEL"].into_iter().collect();
        assert_eq!(list.set(3, Some(b"PREF".as_slice())), Ok(true));
        assert_eq!(list.len(), 4);
        assert_eq!(list.get(1), None);
        assert_eq!(list.get(2), None);
        assert_eq!(list.get(3), Some(BStr::new("PREF")));
    }

    #[test]
    fn set_is_bounded() {
        let mut list = StringList::new();
        assert_eq!(list.set(MAX_INCREMENT - 1, Some(b"x".as_slice())), Ok(true));
        let len = list.len();
        assert_eq!(
            list.set(len + MAX_INCREMENT, Some(b"y".as_slice())),
            Err(AccessError::IndexOutOfRange {
                index: len + MAX_INCREMENT,
                len
            })
        );
    }

    #[test]
    fn set_reports_unchanged() {
        let mut list: StringList = ["a", "b"].into_iter().collect();
        assert_eq!(list.set(1, Some(b"b".as_slice())), Ok(false));
        assert_eq!(list.set(1, None), Ok(true));
        assert_eq!(list.get(1), None);
    }

    #[test]
    fn append_to_last_fills_absent_slot() {
        let mut list = StringList::new();
        list.append_to_last(b"ab").unwrap();
        list.push(None).unwrap();
        list.append_to_last(b"c").unwrap();
        list.append_to_last(b"d").unwrap();
        assert_eq!(list.get(0), Some(BStr::new("ab")));
        assert_eq!(list.get(1), Some(BStr::new("cd")));
    }

    #[test]
    fn case_insensitive_lookup() {
        let list: StringList = [Some("TEL"), None, Some("encoding=base64")]
            .into_iter()
            .collect();
        assert_eq!(list.position(b"tel"), Some(0));
        assert_eq!(list.position(b"BASE64"), None);
        assert_eq!(list.position_containing(b"BASE64"), Some(2));
    }
}
