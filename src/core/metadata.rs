//! String metadata for prims and attributes.
//!
//! Metadata is stored as ordered key-value pairs of strings and is used for
//! descriptive fields such as `kind` and `doc`.

use smallvec::SmallVec;
use std::fmt;

/// Metadata storage - key-value pairs of strings, in authoring order.
///
/// Uses SmallVec optimization for common case of few entries.
#[derive(Clone, Default, PartialEq)]
pub struct MetaData {
    entries: SmallVec<[(String, String); 4]>,
}

impl MetaData {
    /// Model kind key ("component", "group", "assembly", ...).
    pub const KIND_KEY: &'static str = "kind";

    /// Documentation string key.
    pub const DOC_KEY: &'static str = "doc";

    /// Create empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a metadata value, replacing any previous value for `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        for (k, v) in &mut self.entries {
            if k == &key {
                *v = value;
                return;
            }
        }
        self.entries.push((key, value));
    }

    /// Get a metadata value by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Check if a key exists.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Remove a key and return its value.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
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

    /// Iterate over key-value pairs in authoring order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn kind(&self) -> Option<&str> {
        self.get(Self::KIND_KEY)
    }

    pub fn set_kind(&mut self, kind: &str) {
        self.set(Self::KIND_KEY, kind);
    }

    pub fn doc(&self) -> Option<&str> {
        self.get(Self::DOC_KEY)
    }

    pub fn set_doc(&mut self, doc: &str) {
        self.set(Self::DOC_KEY, doc);
    }
}

impl fmt::Debug for MetaData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_basic() {
        let mut meta = MetaData::new();
        meta.set("key1", "value1");
        meta.set("key2", "value2");

        assert_eq!(meta.get("key1"), Some("value1"));
        assert_eq!(meta.get("key2"), Some("value2"));
        assert_eq!(meta.get("key3"), None);
        assert_eq!(meta.len(), 2);
    }

    #[test]
    fn test_metadata_update_keeps_order() {
        let mut meta = MetaData::new();
        meta.set("a", "1");
        meta.set("b", "2");
        meta.set("a", "3");

        let entries: Vec<_> = meta.iter().collect();
        assert_eq!(entries, [("a", "3"), ("b", "2")]);
    }

    #[test]
    fn test_metadata_known_keys() {
        let mut meta = MetaData::new();
        meta.set_kind("component");
        meta.set_doc("A chair");
        assert_eq!(meta.kind(), Some("component"));
        assert_eq!(meta.doc(), Some("A chair"));
        assert_eq!(meta.remove("kind"), Some("component".to_string()));
        assert_eq!(meta.kind(), None);
    }
}
