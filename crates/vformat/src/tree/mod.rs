//! The object/property tree shared by the parser and the writer.
//!
//! Every node lives in a [`Document`] arena and is addressed by a `Copy`
//! handle. Ownership runs downwards (an object owns its properties, a
//! property owns a nested object held as its value) while `parent` and
//! `next` links are plain handles used for upward queries and for the
//! top-level sibling chain.
//!
//! Handles of deleted nodes are recycled, so a handle must not be used
//! after the node it names has been deleted.

mod access;
mod search;

use alloc::{collections::TryReserveError, vec::Vec};
use core::fmt;

use bstr::{BStr, BString, ByteSlice};

pub use search::{ANY, PropertyQuery};

use crate::{
    error::AccessError,
    string_list::{StringList, owned},
};

/// Handle of an [`Object`] inside a [`Document`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(usize);

/// Handle of a [`Property`] inside a [`Document`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(usize);

/// Wire representation of a property value.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Encoding {
    /// Plain text, `;`-separated strings.
    #[default]
    SevenBit,
    /// Raw 8-bit bytes. Parsed, but has no wire form for writing.
    EightBit,
    /// Quoted-printable, `;`-separated strings.
    QuotedPrintable,
    /// BASE64 bytes.
    Base64,
    /// A nested object delimited by `BEGIN`/`END`.
    Object,
}

impl Encoding {
    /// The name token that announces this encoding, if any.
    #[must_use]
    pub fn tag(self) -> Option<&'static str> {
        match self {
            Self::SevenBit | Self::Object => None,
            Self::EightBit => Some("8BIT"),
            Self::QuotedPrintable => Some("QUOTED-PRINTABLE"),
            Self::Base64 => Some("BASE64"),
        }
    }

    /// The encoding announced by a property name.
    ///
    /// Tokens are searched for the markers case-insensitively, so both
    /// `QUOTED-PRINTABLE` and `ENCODING=QUOTED-PRINTABLE` are recognised.
    #[must_use]
    pub fn from_name(name: &StringList) -> Self {
        [Self::QuotedPrintable, Self::Base64, Self::EightBit]
            .into_iter()
            .find(|e| {
                e.tag()
                    .is_some_and(|tag| name.position_containing(tag.as_bytes()).is_some())
            })
            .unwrap_or(Self::SevenBit)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SevenBit => "7BIT",
            Self::EightBit => "8BIT",
            Self::QuotedPrintable => "QUOTED-PRINTABLE",
            Self::Base64 => "BASE64",
            Self::Object => "nested object",
        })
    }
}

/// A property value. The variant is the encoding.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Plain text strings.
    Text(StringList),
    /// Strings written quoted-printable.
    QuotedPrintable(StringList),
    /// Raw bytes.
    EightBit(Vec<u8>),
    /// Bytes written as BASE64.
    Base64(Vec<u8>),
    /// A nested object owned by this value.
    Object(ObjectId),
}

impl Default for Value {
    fn default() -> Self {
        Self::Text(StringList::new())
    }
}

impl Value {
    /// The encoding this value is held in.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        match self {
            Self::Text(_) => Encoding::SevenBit,
            Self::QuotedPrintable(_) => Encoding::QuotedPrintable,
            Self::EightBit(_) => Encoding::EightBit,
            Self::Base64(_) => Encoding::Base64,
            Self::Object(_) => Encoding::Object,
        }
    }

    /// The strings of a text or quoted-printable value.
    #[must_use]
    pub fn strings(&self) -> Option<&StringList> {
        match self {
            Self::Text(s) | Self::QuotedPrintable(s) => Some(s),
            _ => None,
        }
    }

    /// The bytes of an 8-bit or BASE64 value.
    #[must_use]
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Self::EightBit(b) | Self::Base64(b) => Some(b),
            _ => None,
        }
    }

    /// The nested object of an object value.
    #[must_use]
    pub fn object(&self) -> Option<ObjectId> {
        match self {
            Self::Object(id) => Some(*id),
            _ => None,
        }
    }
}

/// One vObject: a type tag and an ordered list of properties.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    kind: BString,
    properties: Vec<PropertyId>,
    modified: bool,
    parent: Option<ObjectId>,
    next: Option<ObjectId>,
}

impl Object {
    /// The type tag, such as `VCARD`.
    #[must_use]
    pub fn kind(&self) -> &BStr {
        self.kind.as_bstr()
    }

    /// Properties in insertion order.
    #[must_use]
    pub fn properties(&self) -> &[PropertyId] {
        &self.properties
    }

    /// Whether a property of this object (or of a nested object) changed.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// The object holding this one as a property value.
    #[must_use]
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    /// The next object in the top-level sibling chain.
    #[must_use]
    pub fn next(&self) -> Option<ObjectId> {
        self.next
    }
}

/// A name/value pair attached to an [`Object`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    group: Option<BString>,
    name: StringList,
    value: Value,
    modified: bool,
    parent: ObjectId,
}

impl Property {
    /// The dot-joined group prefix.
    #[must_use]
    pub fn group(&self) -> Option<&BStr> {
        self.group.as_ref().map(|g| g.as_bstr())
    }

    /// The name followed by its qualifiers.
    #[must_use]
    pub fn name(&self) -> &StringList {
        &self.name
    }

    /// Name token `index`; token 0 is the property name itself.
    #[must_use]
    pub fn name_string(&self, index: usize) -> Option<&BStr> {
        self.name.get(index)
    }

    /// The value.
    #[must_use]
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The encoding the value is held in.
    #[must_use]
    pub fn encoding(&self) -> Encoding {
        self.value.encoding()
    }

    /// Value string `index` of a text or quoted-printable value. Any other
    /// encoding yields `None`.
    #[must_use]
    pub fn value_string(&self, index: usize) -> Option<&BStr> {
        self.value.strings()?.get(index)
    }

    /// The bytes of an 8-bit or BASE64 value.
    #[must_use]
    pub fn value_bytes(&self) -> Option<&[u8]> {
        self.value.bytes()
    }

    /// The nested object of an object value.
    #[must_use]
    pub fn value_object(&self) -> Option<ObjectId> {
        self.value.object()
    }

    /// Whether the property was changed through the access API.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// The owning object.
    #[must_use]
    pub fn parent(&self) -> ObjectId {
        self.parent
    }
}

/// Arena holding any number of object trees.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default)]
pub struct Document {
    objects: Vec<Option<Object>>,
    properties: Vec<Option<Property>>,
    free_objects: Vec<usize>,
    free_properties: Vec<usize>,
    root: Option<ObjectId>,
}

impl Document {
    /// An empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The first top-level object.
    #[must_use]
    pub fn root(&self) -> Option<ObjectId> {
        self.root
    }

    /// All top-level objects in order.
    pub fn roots(&self) -> impl Iterator<Item = ObjectId> + '_ {
        core::iter::successors(self.root, |&id| self.next_object(id))
    }

    /// The sibling after `id` in the top-level chain.
    #[must_use]
    pub fn next_object(&self, id: ObjectId) -> Option<ObjectId> {
        self.object(id)?.next
    }

    /// Look up an object.
    #[must_use]
    pub fn object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(id.0)?.as_ref()
    }

    /// Look up a property.
    #[must_use]
    pub fn property(&self, id: PropertyId) -> Option<&Property> {
        self.properties.get(id.0)?.as_ref()
    }

    /// `true` when the document holds no live objects.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.len() == self.free_objects.len()
    }

    pub(crate) fn object_mut(&mut self, id: ObjectId) -> Result<&mut Object, AccessError> {
        self.objects
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(AccessError::UnknownObject)
    }

    pub(crate) fn property_mut(&mut self, id: PropertyId) -> Result<&mut Property, AccessError> {
        self.properties
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(AccessError::UnknownProperty)
    }

    /// Allocate a detached object of type `kind`.
    ///
    /// The object is not part of the top-level chain until passed to
    /// [`push_root`](Self::push_root), and is not nested until passed to
    /// [`set_value_object`](Self::set_value_object).
    ///
    /// # Errors
    ///
    /// Fails only when the node cannot be allocated.
    pub fn create_object(&mut self, kind: &[u8]) -> Result<ObjectId, AccessError> {
        let object = Object {
            kind: owned(kind)?,
            properties: Vec::new(),
            modified: false,
            parent: None,
            next: None,
        };
        if let Some(slot) = self.free_objects.pop() {
            self.objects[slot] = Some(object);
            return Ok(ObjectId(slot));
        }
        self.objects.try_reserve(1)?;
        self.objects.push(Some(object));
        Ok(ObjectId(self.objects.len() - 1))
    }

    /// Link a detached object to the end of the top-level chain.
    ///
    /// # Errors
    ///
    /// [`AccessError::AlreadyAttached`] if the object is nested or already
    /// in the chain.
    pub fn push_root(&mut self, id: ObjectId) -> Result<(), AccessError> {
        let object = self.object(id).ok_or(AccessError::UnknownObject)?;
        if object.parent.is_some() || object.next.is_some() || self.is_root(id) {
            return Err(AccessError::AlreadyAttached);
        }
        let tail = self.roots().last();
        match tail {
            Some(tail) => self.object_mut(tail)?.next = Some(id),
            None => self.root = Some(id),
        }
        Ok(())
    }

    /// Whether `id` is in the top-level chain.
    #[must_use]
    pub fn is_root(&self, id: ObjectId) -> bool {
        self.roots().any(|r| r == id)
    }

    /// Append a property with an empty name and an empty text value.
    ///
    /// # Errors
    ///
    /// Fails if the object is unknown or the node cannot be allocated.
    pub fn append_property(&mut self, object: ObjectId) -> Result<PropertyId, AccessError> {
        self.insert_property(object, None, StringList::new(), Value::default())
    }

    /// Append a finished property to `object`. An object value becomes a
    /// child of `object`.
    pub(crate) fn insert_property(
        &mut self,
        object: ObjectId,
        group: Option<BString>,
        name: StringList,
        value: Value,
    ) -> Result<PropertyId, AccessError> {
        self.object_mut(object)?.properties.try_reserve(1)?;
        if let Value::Object(child) = value {
            self.object_mut(child)?.parent = Some(object);
        }
        let property = Property {
            group,
            name,
            value,
            modified: false,
            parent: object,
        };
        let id = if let Some(slot) = self.free_properties.pop() {
            self.properties[slot] = Some(property);
            PropertyId(slot)
        } else {
            self.properties.try_reserve(1)?;
            self.properties.push(Some(property));
            PropertyId(self.properties.len() - 1)
        };
        self.object_mut(object)?.properties.push(id);
        Ok(id)
    }

    /// Create an object of type `kind` nested in `parent`, held by a new
    /// property named after the type.
    ///
    /// # Errors
    ///
    /// Fails if `parent` is unknown or allocation fails.
    pub fn add_sub_object(
        &mut self,
        parent: ObjectId,
        kind: &[u8],
    ) -> Result<(PropertyId, ObjectId), AccessError> {
        self.object(parent).ok_or(AccessError::UnknownObject)?;
        let child = self.create_object(kind)?;
        let mut name = StringList::new();
        name.push(Some(kind))?;
        let property = self.insert_property(parent, None, name, Value::Object(child))?;
        self.mark_modified(property, true)?;
        Ok((property, child))
    }

    /// Release the value of a property, leaving an empty text value, and
    /// optionally its name and group as well.
    ///
    /// # Errors
    ///
    /// Fails if the property is unknown.
    pub fn clear_property(&mut self, id: PropertyId, clear_name: bool) -> Result<(), AccessError> {
        let property = self.property_mut(id)?;
        let old = core::mem::take(&mut property.value);
        if clear_name {
            property.name.clear();
            property.group = None;
        }
        self.release_value(old);
        Ok(())
    }

    /// Delete a property and anything its value owns.
    ///
    /// # Errors
    ///
    /// Fails if the property is unknown.
    pub fn delete_property(&mut self, id: PropertyId) -> Result<(), AccessError> {
        let parent = self.property(id).ok_or(AccessError::UnknownProperty)?.parent;
        if let Ok(object) = self.object_mut(parent) {
            object.properties.retain(|&p| p != id);
        }
        self.remove_property_tree(id);
        Ok(())
    }

    /// Delete an object with its properties and nested objects.
    ///
    /// A nested object is removed together with the property holding it.
    /// A top-level object is unlinked from the sibling chain; with
    /// `siblings` every later object in the chain is deleted too.
    ///
    /// # Errors
    ///
    /// Fails if the object is unknown.
    pub fn delete_object(&mut self, id: ObjectId, siblings: bool) -> Result<(), AccessError> {
        let object = self.object(id).ok_or(AccessError::UnknownObject)?;
        if let Some(parent) = object.parent {
            let holder = self.object(parent).and_then(|p| {
                p.properties
                    .iter()
                    .copied()
                    .find(|&pid| self.property(pid).and_then(Property::value_object) == Some(id))
            });
            return match holder {
                Some(holder) => self.delete_property(holder),
                None => {
                    self.remove_object_tree(id);
                    Ok(())
                }
            };
        }

        let next = object.next;
        let prev = self.roots().take_while(|&r| r != id).last();
        let in_chain = self.root == Some(id) || prev.is_some_and(|p| self.next_object(p) == Some(id));
        let doomed: Vec<ObjectId> = if siblings {
            core::iter::successors(Some(id), |&o| self.next_object(o)).collect()
        } else {
            Vec::from([id])
        };
        if in_chain {
            let relink = if siblings { None } else { next };
            match prev {
                Some(p) => self.object_mut(p)?.next = relink,
                None => self.root = relink,
            }
        }
        for object in doomed {
            self.remove_object_tree(object);
        }
        Ok(())
    }

    /// Delete every object.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Deep-copy an object and everything nested in it. The copy is
    /// detached and unmodified.
    ///
    /// # Errors
    ///
    /// Fails if the object is unknown or allocation fails; nothing of a
    /// partial copy is left behind.
    pub fn clone_object(&mut self, id: ObjectId) -> Result<ObjectId, AccessError> {
        let kind = owned(self.object(id).ok_or(AccessError::UnknownObject)?.kind())?;
        let copy = self.create_object(&kind)?;
        match self.copy_properties(id, copy) {
            Ok(()) => Ok(copy),
            Err(err) => {
                self.remove_object_tree(copy);
                Err(err)
            }
        }
    }

    /// Fill `copy` with copies of the properties of `source`, level by
    /// level through a worklist.
    fn copy_properties(&mut self, source: ObjectId, copy: ObjectId) -> Result<(), AccessError> {
        let mut pending = Vec::from([(source, copy)]);
        while let Some((source, copy)) = pending.pop() {
            let properties = self.object(source).ok_or(AccessError::UnknownObject)?.properties.clone();
            for pid in properties {
                let property = self.property(pid).ok_or(AccessError::UnknownProperty)?;
                let group = property.group.as_ref().map(|g| owned(g)).transpose()?;
                let name = property.name.try_clone()?;
                let value = match &property.value {
                    Value::Text(s) => Value::Text(s.try_clone()?),
                    Value::QuotedPrintable(s) => Value::QuotedPrintable(s.try_clone()?),
                    Value::EightBit(b) => Value::EightBit(bytes_clone(b)?),
                    Value::Base64(b) => Value::Base64(bytes_clone(b)?),
                    Value::Object(child) => Value::Object(*child),
                };
                let value = match value {
                    Value::Object(child) => {
                        let kind = owned(self.object(child).ok_or(AccessError::UnknownObject)?.kind())?;
                        let child_copy = self.create_object(&kind)?;
                        pending.try_reserve(1)?;
                        pending.push((child, child_copy));
                        Value::Object(child_copy)
                    }
                    value => value,
                };
                self.insert_property(copy, group, name, value)?;
            }
        }
        Ok(())
    }

    /// Whether `a` in this document and `b` in `other` have the same type
    /// tags, groups, names and values all the way down. Modified flags are
    /// ignored.
    #[must_use]
    pub fn object_eq(&self, a: ObjectId, other: &Document, b: ObjectId) -> bool {
        let mut pending = Vec::from([(a, b)]);
        while let Some((a, b)) = pending.pop() {
            let (Some(x), Some(y)) = (self.object(a), other.object(b)) else {
                return false;
            };
            if x.kind != y.kind || x.properties.len() != y.properties.len() {
                return false;
            }
            for (&p, &q) in x.properties.iter().zip(&y.properties) {
                let (Some(p), Some(q)) = (self.property(p), other.property(q)) else {
                    return false;
                };
                if p.group != q.group || p.name != q.name {
                    return false;
                }
                match (&p.value, &q.value) {
                    (Value::Object(c), Value::Object(d)) => pending.push((*c, *d)),
                    (v, w) if v != w => return false,
                    _ => {}
                }
            }
        }
        true
    }

    pub(crate) fn release_value(&mut self, value: Value) {
        if let Value::Object(child) = value {
            self.remove_object_tree(child);
        }
    }

    fn remove_object_tree(&mut self, id: ObjectId) {
        let mut doomed = Vec::from([id]);
        while let Some(id) = doomed.pop() {
            let Some(object) = self.objects.get_mut(id.0).and_then(Option::take) else {
                continue;
            };
            self.free_objects.push(id.0);
            for pid in object.properties {
                doomed.extend(self.take_property(pid));
            }
        }
    }

    fn remove_property_tree(&mut self, id: PropertyId) {
        if let Some(child) = self.take_property(id) {
            self.remove_object_tree(child);
        }
    }

    /// Free a property slot, handing back the nested object its value held.
    fn take_property(&mut self, id: PropertyId) -> Option<ObjectId> {
        let property = self.properties.get_mut(id.0).and_then(Option::take)?;
        self.free_properties.push(id.0);
        property.value.object()
    }
}

pub(crate) fn bytes_clone(bytes: &[u8]) -> Result<Vec<u8>, TryReserveError> {
    let mut v = Vec::new();
    v.try_reserve_exact(bytes.len())?;
    v.extend_from_slice(bytes);
    Ok(v)
}
