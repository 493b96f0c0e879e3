//! Locating properties by group, name and qualifiers.

use bstr::{BStr, ByteSlice};

use super::{Document, ObjectId, Property, PropertyId, Value};
use crate::{
    error::AccessError,
    string_list::{StringList, owned},
};

/// Wildcard accepted in place of a group, a name or a qualifier.
pub const ANY: &str = "*";

/// Which properties to look for.
///
/// ```
/// # use vformat::PropertyQuery;
/// let doc = vformat::parse(b"BEGIN:VCARD\r\nTEL;WORK;PREF:555\r\nEND:VCARD\r\n").unwrap();
/// let card = doc.root().unwrap();
/// let query = PropertyQuery::new("tel").qualifiers(&["pref"]);
/// let tel = doc.find_property(card, query).unwrap();
/// assert_eq!(doc.property(tel).unwrap().value_string(0).unwrap(), "555");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyQuery<'a> {
    group: Option<&'a str>,
    name: &'a str,
    qualifiers: &'a [&'a str],
    any_name: bool,
}

impl<'a> PropertyQuery<'a> {
    /// Match properties called `name` (ignoring ASCII case) in any group.
    #[must_use]
    pub const fn new(name: &'a str) -> Self {
        Self {
            group: None,
            name,
            qualifiers: &[],
            any_name: false,
        }
    }

    /// Only match properties in `group`.
    #[must_use]
    pub const fn group(mut self, group: &'a str) -> Self {
        self.group = Some(group);
        self
    }

    /// Require every one of `qualifiers` among the name tokens.
    #[must_use]
    pub const fn qualifiers(mut self, qualifiers: &'a [&'a str]) -> Self {
        self.qualifiers = qualifiers;
        self
    }

    /// Ignore the property name; match on group and qualifiers only.
    #[must_use]
    pub const fn any_name(mut self) -> Self {
        self.any_name = true;
        self
    }

    /// Whether `property` satisfies the query.
    #[must_use]
    pub fn matches(&self, property: &Property) -> bool {
        let group_ok = match self.group {
            None | Some(ANY) => true,
            Some(group) => property
                .group
                .as_ref()
                .is_some_and(|g| g.eq_ignore_ascii_case(group.as_bytes())),
        };
        let name_ok = self.any_name
            || self.name == ANY
            || property
                .name
                .get(0)
                .is_some_and(|n| n.eq_ignore_ascii_case(self.name.as_bytes()));
        group_ok
            && name_ok
            && self
                .qualifiers
                .iter()
                .all(|&q| q == ANY || property.name.position(q.as_bytes()).is_some())
    }
}

impl Document {
    /// Properties of `object` matching `query`, in order.
    pub fn find_properties<'a>(
        &'a self,
        object: ObjectId,
        query: PropertyQuery<'a>,
    ) -> impl Iterator<Item = PropertyId> + 'a {
        self.object(object)
            .map(super::Object::properties)
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(move |&id| self.property(id).is_some_and(|p| query.matches(p)))
    }

    /// The first property of `object` matching `query`.
    #[must_use]
    pub fn find_property(&self, object: ObjectId, query: PropertyQuery<'_>) -> Option<PropertyId> {
        self.find_properties(object, query).next()
    }

    /// The first property matching `query`, appending an empty text
    /// property with the query's group, name and qualifiers if there is
    /// none.
    ///
    /// # Errors
    ///
    /// Fails if the object is unknown or allocation fails.
    pub fn get_or_append_property(
        &mut self,
        object: ObjectId,
        query: PropertyQuery<'_>,
    ) -> Result<PropertyId, AccessError> {
        self.object(object).ok_or(AccessError::UnknownObject)?;
        if let Some(found) = self.find_property(object, query) {
            return Ok(found);
        }
        let mut name = StringList::new();
        name.push(Some(query.name.as_bytes()))?;
        for qualifier in query.qualifiers.iter().filter(|&&q| q != ANY) {
            name.push(Some(qualifier.as_bytes()))?;
        }
        let group = match query.group {
            None | Some(ANY) => None,
            Some(group) => Some(owned(group.as_bytes())?),
        };
        let id = self.insert_property(object, group, name, Value::default())?;
        self.mark_modified(id, true)?;
        Ok(id)
    }
}

impl Property {
    /// Index of the first qualifier equal to `token`, ignoring ASCII case.
    /// The property name itself (token 0) is not a qualifier.
    #[must_use]
    pub fn qualifier_index(&self, token: &str) -> Option<usize> {
        self.qualifiers()
            .find(|(_, q)| q.eq_ignore_ascii_case(token.as_bytes()))
            .map(|(i, _)| i)
    }

    /// The first qualifier equal to one of `choices`, as
    /// `(name token index, choice index)`.
    #[must_use]
    pub fn qualifier_choice(&self, choices: &[&str]) -> Option<(usize, usize)> {
        self.qualifiers().find_map(|(i, q)| {
            choices
                .iter()
                .position(|c| q.eq_ignore_ascii_case(c.as_bytes()))
                .map(|c| (i, c))
        })
    }

    /// The text after `key=` in the first qualifier of that form.
    ///
    /// ```
    /// let doc = vformat::parse(b"BEGIN:VCARD\r\nN;CHARSET=UTF-8:x\r\nEND:VCARD\r\n").unwrap();
    /// let n = doc.object(doc.root().unwrap()).unwrap().properties()[0];
    /// let n = doc.property(n).unwrap();
    /// assert_eq!(n.qualifier_value("charset").unwrap(), "UTF-8");
    /// assert_eq!(n.charset().unwrap(), "UTF-8");
    /// ```
    #[must_use]
    pub fn qualifier_value(&self, key: &str) -> Option<&BStr> {
        let key = key.as_bytes();
        self.qualifiers().find_map(|(_, q)| {
            let (k, v) = q.split_once_str("=")?;
            k.eq_ignore_ascii_case(key).then(|| v.as_bstr())
        })
    }

    /// The `CHARSET` qualifier value.
    #[must_use]
    pub fn charset(&self) -> Option<&BStr> {
        self.qualifier_value("CHARSET")
    }

    fn qualifiers(&self) -> impl Iterator<Item = (usize, &BStr)> + '_ {
        self.name
            .iter()
            .enumerate()
            .skip(1)
            .filter_map(|(i, q)| Some((i, q?)))
    }
}
