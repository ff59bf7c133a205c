//! In-memory key-value store.

use std::collections::HashMap;

use crate::error::Result;

use super::KeyValueStore;

/// A [`KeyValueStore`] backed by a `HashMap`. Nothing survives the process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding a single entry.
    #[must_use]
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.into(), value.into());
        Self { entries }
    }

    /// Number of keys held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_basics() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.get("items").unwrap(), None);

        store.set("items", "[]").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("items").unwrap().as_deref(), Some("[]"));

        store.set("items", "[{}]").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("items").unwrap().as_deref(), Some("[{}]"));
    }

    #[test]
    fn test_with_entry() {
        let store = MemoryStore::with_entry("items", "null");
        assert_eq!(store.get("items").unwrap().as_deref(), Some("null"));
    }
}
