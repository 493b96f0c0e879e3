use alloc::{collections::TryReserveError, vec::Vec};

use bstr::BString;

use crate::{
    string_list::StringList,
    tree::{Encoding, Value},
};

/// The property currently being read, before it is committed to the tree.
#[derive(Debug, Default)]
pub(super) struct PendingProperty {
    pub(super) group: Option<BString>,
    pub(super) name: StringList,
    pub(super) encoding: Encoding,
    pub(super) strings: StringList,
    pub(super) bytes: Vec<u8>,
}

impl PendingProperty {
    pub(super) fn reset_name(&mut self) {
        self.name.clear();
        self.group = None;
    }

    /// Start a new name qualifier. A leading `;` leaves the name itself
    /// absent rather than turning the qualifier into the name.
    pub(super) fn push_qualifier(&mut self) -> Result<(), TryReserveError> {
        if self.name.is_empty() {
            self.name.push(None)?;
        }
        self.name.push(None)
    }

    /// The name read so far was a group: append it to the dot-joined group
    /// and start the name afresh.
    pub(super) fn move_name_to_group(&mut self) -> Result<(), TryReserveError> {
        let token = self.name.take(0).unwrap_or_default();
        self.name.clear();
        match &mut self.group {
            Some(group) => {
                group.try_reserve(token.len() + 1)?;
                group.push(b'.');
                group.extend_from_slice(&token);
            }
            None => self.group = Some(token),
        }
        Ok(())
    }

    pub(super) fn push_byte(&mut self, byte: u8) -> Result<(), TryReserveError> {
        self.bytes.try_reserve(1)?;
        self.bytes.push(byte);
        Ok(())
    }

    pub(super) fn into_parts(self) -> (Option<BString>, StringList, Value) {
        let value = match self.encoding {
            Encoding::SevenBit | Encoding::Object => Value::Text(self.strings),
            Encoding::QuotedPrintable => Value::QuotedPrintable(self.strings),
            Encoding::EightBit => Value::EightBit(self.bytes),
            Encoding::Base64 => Value::Base64(self.bytes),
        };
        (self.group, self.name, value)
    }
}
