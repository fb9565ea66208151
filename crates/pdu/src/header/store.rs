//! Case-insensitive, order-preserving header field storage.

use std::borrow::Cow;

use bytes::{BufMut, BytesMut};
use indexmap::IndexMap;
use tracing::debug;

use super::catalog::{self, HeaderFieldDescriptor};
use super::value::{HeaderType, HeaderValue};

#[derive(Debug, Clone)]
struct HeaderEntry {
    /// The name as first written, used when serializing
    name: String,
    value: HeaderValue,
}

/// The header fields of one message.
///
/// Names are matched ignoring ASCII case and there is at most one entry per name; fields keep
/// the position of their first insertion. Values start out as [`HeaderValue::Text`] after
/// parsing and are replaced by their typed form the first time a typed read succeeds.
#[derive(Debug, Clone, Default)]
pub struct HeaderStore {
    entries: IndexMap<String, HeaderEntry>,
}

fn key(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

impl HeaderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: IndexMap::with_capacity(capacity) }
    }

    /// Sets a field, or removes it when `value` is `None`. Returns the previous value.
    pub fn set(&mut self, name: &str, value: Option<HeaderValue>) -> Option<HeaderValue> {
        match value {
            Some(value) => self.insert(name, value),
            None => self.remove(name),
        }
    }

    /// Inserts or overwrites a field. Returns the previous value.
    pub fn insert(&mut self, name: &str, value: impl Into<HeaderValue>) -> Option<HeaderValue> {
        let value = value.into();
        match self.entries.get_mut(&key(name)) {
            Some(entry) => Some(std::mem::replace(&mut entry.value, value)),
            None => {
                self.entries.insert(key(name), HeaderEntry { name: name.trim().to_string(), value });
                None
            }
        }
    }

    /// Adds a value to a field, joining it to an existing value as a list.
    ///
    /// `Cookie` values are joined with `; `, everything else with `, `.
    pub fn append(&mut self, name: &str, text: &str) {
        let key = key(name);
        let separator = if key == "cookie" { "; " } else { ", " };
        match self.entries.get_mut(&key) {
            Some(entry) => {
                let mut joined = entry.value.to_string();
                if !joined.is_empty() && !text.is_empty() {
                    joined.push_str(separator);
                }
                joined.push_str(text);
                entry.value = HeaderValue::Text(joined);
            }
            None => {
                self.entries.insert(key, HeaderEntry { name: name.trim().to_string(), value: HeaderValue::Text(text.to_string()) });
            }
        }
    }

    /// Continues the last value of a field with an obs-fold line.
    pub(crate) fn continue_line(&mut self, name: &str, text: &str) {
        if let Some(entry) = self.entries.get_mut(&key(name)) {
            let mut joined = entry.value.to_string();
            joined.push(' ');
            joined.push_str(text);
            entry.value = HeaderValue::Text(joined);
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<HeaderValue> {
        self.entries.shift_remove(&key(name)).map(|entry| entry.value)
    }

    pub fn get(&self, name: &str) -> Option<&HeaderValue> {
        self.entries.get(&key(name)).map(|entry| &entry.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&key(name))
    }

    /// The field rendered as wire text, whatever its stored representation.
    pub fn get_text(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|value| match value {
            HeaderValue::Text(text) => Cow::Borrowed(text.as_str()),
            value => Cow::Owned(value.to_string()),
        })
    }

    /// Reads a field as `T`.
    ///
    /// A value already stored as `T` is returned directly. Raw text is only coerced for the
    /// integer types; a successful coercion is written back so later reads skip the parse.
    /// Anything that does not convert yields `None`.
    pub fn get_typed<T: HeaderType + Clone>(&mut self, name: &str) -> Option<T> {
        let entry = self.entries.get_mut(&key(name))?;
        if let Some(value) = T::from_value(&entry.value) {
            return Some(value);
        }

        let HeaderValue::Text(text) = &entry.value else {
            return None;
        };
        let value = T::from_text(text)?;
        entry.value = value.clone().into_value();
        Some(value)
    }

    /// Reads a field through its descriptor's parser, memoizing the parsed value.
    ///
    /// A value that does not satisfy the descriptor yields `None` and is left untouched.
    pub fn get_by_descriptor(&mut self, descriptor: &HeaderFieldDescriptor) -> Option<&HeaderValue> {
        let entry = self.entries.get_mut(&key(descriptor.name()))?;
        if !descriptor.accepts(&entry.value) {
            match descriptor.parse(&entry.value.to_string()) {
                Ok(value) => entry.value = value,
                Err(e) => {
                    debug!(header = descriptor.name(), cause = %e, "header value does not match its field type");
                    return None;
                }
            }
        }
        Some(&entry.value)
    }

    /// Removes hop-by-hop fields: the well-known ones and those named by `Connection`.
    pub fn strip_hop_by_hop(&mut self) {
        let listed: Vec<String> = self
            .get(catalog::CONNECTION.name())
            .map(|value| value.to_string().split(',').map(key).filter(|name| !name.is_empty()).collect())
            .unwrap_or_default();

        self.entries.retain(|key, _| !catalog::is_hop_by_hop(key) && !listed.contains(key));
    }

    /// Iterates `(name, value)` pairs in insertion order, names as first written.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &HeaderValue)> {
        self.entries.values().map(|entry| (entry.name.as_str(), &entry.value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Writes every field as a `Name: value\r\n` line, using the descriptor's serializer for
    /// well-known fields.
    pub fn write_to(&self, dst: &mut BytesMut) {
        for entry in self.entries.values() {
            dst.put_slice(entry.name.as_bytes());
            dst.put_slice(b": ");
            match catalog::lookup(&entry.name) {
                Some(descriptor) => dst.put_slice(descriptor.serialize(&entry.value).as_bytes()),
                None => dst.put_slice(entry.value.to_string().as_bytes()),
            }
            dst.put_slice(b"\r\n");
        }
    }
}

impl<'a> FromIterator<(&'a str, HeaderValue)> for HeaderStore {
    fn from_iter<T: IntoIterator<Item = (&'a str, HeaderValue)>>(iter: T) -> Self {
        let mut store = Self::new();
        for (name, value) in iter {
            store.insert(name, value);
        }
        store
    }
}
