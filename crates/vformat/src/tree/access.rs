//! Changing property contents.
//!
//! Every successful change marks the property modified and propagates the
//! flag up through all enclosing objects. Changing a value's encoding also
//! rewrites the encoding token in the property name so that the written
//! form parses back with the same encoding.

use alloc::vec::Vec;

use bstr::BString;

use super::{Document, Encoding, ObjectId, PropertyId, Value, bytes_clone};
use crate::{
    error::AccessError,
    string_list::{StringList, contains_ignore_case, owned},
};

/// Name tokens that carry encoding information.
const ENCODING_MARKERS: [&[u8]; 5] = [b"ENCODING", b"QUOTED-PRINTABLE", b"BASE64", b"8BIT", b"7BIT"];

impl Document {
    /// Set the group prefix.
    ///
    /// # Errors
    ///
    /// Fails if the property is unknown or allocation fails.
    pub fn set_group(&mut self, id: PropertyId, group: impl AsRef<[u8]>) -> Result<(), AccessError> {
        let group = owned(group.as_ref())?;
        self.property_mut(id)?.group = Some(group);
        self.mark_modified(id, true)
    }

    /// Remove the group prefix.
    ///
    /// # Errors
    ///
    /// Fails if the property is unknown.
    pub fn remove_group(&mut self, id: PropertyId) -> Result<(), AccessError> {
        if self.property_mut(id)?.group.take().is_some() {
            self.mark_modified(id, true)?;
        }
        Ok(())
    }

    /// Set name token `index`, growing the name by a bounded amount.
    ///
    /// # Errors
    ///
    /// Fails if the property is unknown, the index lies too far past the
    /// end, or allocation fails.
    pub fn set_name_string(
        &mut self,
        id: PropertyId,
        index: usize,
        token: impl AsRef<[u8]>,
    ) -> Result<(), AccessError> {
        self.update_name(id, |name| name.set(index, Some(token.as_ref())))
    }

    /// Make name token `index` absent.
    ///
    /// # Errors
    ///
    /// As for [`set_name_string`](Self::set_name_string).
    pub fn unset_name_string(&mut self, id: PropertyId, index: usize) -> Result<(), AccessError> {
        self.update_name(id, |name| name.set(index, None))
    }

    /// Append a name token.
    ///
    /// # Errors
    ///
    /// Fails if the property is unknown or allocation fails.
    pub fn push_name_string(&mut self, id: PropertyId, token: impl AsRef<[u8]>) -> Result<(), AccessError> {
        self.update_name(id, |name| {
            name.push(Some(token.as_ref()))?;
            Ok(true)
        })
    }

    /// Set value string `index`. A value that does not hold strings is
    /// replaced by an empty text value first.
    ///
    /// The string is stored as given. A plain text string holding a line
    /// break or `;` is refused later by the writer with
    /// [`WriteError::UnwritableByte`](crate::WriteError::UnwritableByte);
    /// store such data quoted-printable instead.
    ///
    /// # Errors
    ///
    /// Fails if the property is unknown, the index lies too far past the
    /// end, or allocation fails.
    pub fn set_value_string(
        &mut self,
        id: PropertyId,
        index: usize,
        value: impl AsRef<[u8]>,
    ) -> Result<(), AccessError> {
        self.update_strings(id, |strings| strings.set(index, Some(value.as_ref())))
    }

    /// Make value string `index` absent.
    ///
    /// # Errors
    ///
    /// As for [`set_value_string`](Self::set_value_string).
    pub fn unset_value_string(&mut self, id: PropertyId, index: usize) -> Result<(), AccessError> {
        self.update_strings(id, |strings| strings.set(index, None))
    }

    /// Append a value string.
    ///
    /// # Errors
    ///
    /// As for [`set_value_string`](Self::set_value_string).
    pub fn push_value_string(&mut self, id: PropertyId, value: impl AsRef<[u8]>) -> Result<(), AccessError> {
        self.update_strings(id, |strings| {
            strings.push(Some(value.as_ref()))?;
            Ok(true)
        })
    }

    /// Store `bytes` as the whole value in `encoding`. Text encodings get a
    /// single string, so an [`Encoding::SevenBit`] value must not hold a
    /// line break or `;` if it is to be written.
    ///
    /// # Errors
    ///
    /// [`AccessError::UnsupportedEncoding`] for [`Encoding::Object`], or a
    /// failure of [`set_value`](Self::set_value).
    pub fn set_value_bytes(
        &mut self,
        id: PropertyId,
        bytes: &[u8],
        encoding: Encoding,
    ) -> Result<(), AccessError> {
        let value = match encoding {
            Encoding::Base64 => Value::Base64(bytes_clone(bytes)?),
            Encoding::EightBit => Value::EightBit(bytes_clone(bytes)?),
            Encoding::SevenBit | Encoding::QuotedPrintable => {
                let mut strings = StringList::new();
                strings.push(Some(bytes))?;
                if encoding == Encoding::SevenBit {
                    Value::Text(strings)
                } else {
                    Value::QuotedPrintable(strings)
                }
            }
            Encoding::Object => return Err(AccessError::UnsupportedEncoding(encoding)),
        };
        self.set_value(id, value)
    }

    /// Replace the value. The previous value, including any nested object,
    /// is released.
    ///
    /// # Errors
    ///
    /// Fails if the property is unknown, or as for
    /// [`set_value_object`](Self::set_value_object).
    pub fn set_value(&mut self, id: PropertyId, value: Value) -> Result<(), AccessError> {
        if let Value::Object(object) = value {
            return self.set_value_object(id, object);
        }
        self.replace_value(id, value)?;
        self.mark_modified(id, true)
    }

    /// Make a detached object the value of a property.
    ///
    /// # Errors
    ///
    /// [`AccessError::WouldCreateCycle`] if the property belongs to the
    /// object, [`AccessError::AlreadyAttached`] if the object is already a
    /// root or a nested value.
    pub fn set_value_object(&mut self, id: PropertyId, object: ObjectId) -> Result<(), AccessError> {
        let owner = self.property(id).ok_or(AccessError::UnknownProperty)?.parent;
        let attached = self.object(object).ok_or(AccessError::UnknownObject)?.parent.is_some();
        if self.property_belongs_to(id, object) {
            return Err(AccessError::WouldCreateCycle);
        }
        if attached || self.is_root(object) {
            return Err(AccessError::AlreadyAttached);
        }
        self.object_mut(object)?.parent = Some(owner);
        self.replace_value(id, Value::Object(object))?;
        self.mark_modified(id, true)
    }

    /// Convert the value to `encoding`.
    ///
    /// Strings survive a switch between text and quoted-printable, bytes
    /// survive a switch between BASE64 and 8-bit; any other switch starts
    /// from an empty value.
    ///
    /// # Errors
    ///
    /// [`AccessError::UnsupportedEncoding`] for [`Encoding::Object`]; use
    /// [`set_value_object`](Self::set_value_object) instead.
    pub fn set_encoding(&mut self, id: PropertyId, encoding: Encoding) -> Result<(), AccessError> {
        if encoding == Encoding::Object {
            return Err(AccessError::UnsupportedEncoding(encoding));
        }
        let property = self.property_mut(id)?;
        if property.value.encoding() == encoding {
            return Ok(());
        }
        let value = match (core::mem::take(&mut property.value), encoding) {
            (Value::Text(s) | Value::QuotedPrintable(s), Encoding::SevenBit) => Value::Text(s),
            (Value::Text(s) | Value::QuotedPrintable(s), Encoding::QuotedPrintable) => {
                Value::QuotedPrintable(s)
            }
            (Value::Base64(b) | Value::EightBit(b), Encoding::Base64) => Value::Base64(b),
            (Value::Base64(b) | Value::EightBit(b), Encoding::EightBit) => Value::EightBit(b),
            (old, _) => {
                self.release_value(old);
                match encoding {
                    Encoding::QuotedPrintable => Value::QuotedPrintable(StringList::new()),
                    Encoding::Base64 => Value::Base64(Vec::new()),
                    Encoding::EightBit => Value::EightBit(Vec::new()),
                    Encoding::SevenBit | Encoding::Object => Value::default(),
                }
            }
        };
        self.property_mut(id)?.value = value;
        self.sync_encoding_tag(id, encoding)?;
        self.mark_modified(id, true)
    }

    /// Flag a property as modified, together with its owning object and,
    /// with `propagate`, every enclosing object.
    ///
    /// # Errors
    ///
    /// Fails if the property is unknown.
    pub fn mark_modified(&mut self, id: PropertyId, propagate: bool) -> Result<(), AccessError> {
        let property = self.property_mut(id)?;
        property.modified = true;
        let mut owner = Some(property.parent);
        while let Some(current) = owner {
            let object = self.object_mut(current)?;
            object.modified = true;
            owner = if propagate { object.parent } else { None };
        }
        Ok(())
    }

    /// Reset the modified flags of an object and everything in it.
    ///
    /// # Errors
    ///
    /// Fails if the object is unknown.
    pub fn clear_modified(&mut self, id: ObjectId) -> Result<(), AccessError> {
        let mut pending = Vec::from([id]);
        while let Some(id) = pending.pop() {
            let object = self.object_mut(id)?;
            object.modified = false;
            let properties = object.properties.clone();
            for pid in properties {
                let property = self.property_mut(pid)?;
                property.modified = false;
                if let Value::Object(child) = property.value {
                    pending.push(child);
                }
            }
        }
        Ok(())
    }

    /// Whether `object` is the owner of the property or any ancestor of
    /// that owner.
    #[must_use]
    pub fn property_belongs_to(&self, id: PropertyId, object: ObjectId) -> bool {
        let Some(property) = self.property(id) else {
            return false;
        };
        core::iter::successors(Some(property.parent), |&o| self.object(o)?.parent).any(|o| o == object)
    }

    /// The full property name as written: `group.NAME;QUALIFIER;...`.
    #[must_use]
    pub fn property_name(&self, id: PropertyId) -> Option<BString> {
        let property = self.property(id)?;
        let mut out = Vec::new();
        if let Some(group) = &property.group {
            out.extend_from_slice(group);
            out.push(b'.');
        }
        for (i, token) in property.name.iter().enumerate() {
            if i > 0 {
                out.push(b';');
            }
            if let Some(token) = token {
                out.extend_from_slice(token);
            }
        }
        Some(out.into())
    }

    fn update_name(
        &mut self,
        id: PropertyId,
        f: impl FnOnce(&mut StringList) -> Result<bool, AccessError>,
    ) -> Result<(), AccessError> {
        if f(&mut self.property_mut(id)?.name)? {
            self.mark_modified(id, true)?;
        }
        Ok(())
    }

    fn update_strings(
        &mut self,
        id: PropertyId,
        f: impl FnOnce(&mut StringList) -> Result<bool, AccessError>,
    ) -> Result<(), AccessError> {
        if self.with_strings(id, f)? {
            self.mark_modified(id, true)?;
        }
        Ok(())
    }

    fn with_strings<R>(
        &mut self,
        id: PropertyId,
        f: impl FnOnce(&mut StringList) -> Result<R, AccessError>,
    ) -> Result<R, AccessError> {
        let property = self.property_mut(id)?;
        let old = match &mut property.value {
            Value::Text(strings) | Value::QuotedPrintable(strings) => return f(strings),
            other => core::mem::take(other),
        };
        self.release_value(old);
        self.sync_encoding_tag(id, Encoding::SevenBit)?;
        self.with_strings(id, f)
    }

    /// Swap in a new value, keeping the name's encoding token in step.
    fn replace_value(&mut self, id: PropertyId, value: Value) -> Result<(), AccessError> {
        let property = self.property_mut(id)?;
        let from = property.value.encoding();
        let to = value.encoding();
        let old = core::mem::replace(&mut property.value, value);
        self.release_value(old);
        if from != to {
            self.sync_encoding_tag(id, to)?;
        }
        Ok(())
    }

    fn sync_encoding_tag(&mut self, id: PropertyId, encoding: Encoding) -> Result<(), AccessError> {
        let name = &mut self.property_mut(id)?.name;
        let existing = (1..name.len()).find(|&i| {
            name.get(i)
                .is_some_and(|token| ENCODING_MARKERS.iter().any(|m| contains_ignore_case(token, m)))
        });
        match (existing, encoding.tag()) {
            (Some(i), Some(tag)) => {
                name.set(i, Some(tag.as_bytes()))?;
            }
            (Some(i), None) => {
                name.remove(i);
            }
            (None, Some(tag)) => {
                if name.is_empty() {
                    name.push(None)?;
                }
                name.push(Some(tag.as_bytes()))?;
            }
            (None, None) => {}
        }
        Ok(())
    }
}
