use std::collections::HashMap;
use std::sync::Mutex;

use super::KeyValueStore;
use super::error::{InvariantViolationSnafu, StorageResult};

/// Process-local store. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with one entry.
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(key.into(), value.into());
        Self {
            entries: Mutex::new(entries),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let Ok(entries) = self.entries.lock() else {
            return InvariantViolationSnafu {
                stage: "memory-store-get",
                details: "memory store lock poisoned".to_string(),
            }
            .fail();
        };
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let Ok(mut entries) = self.entries.lock() else {
            return InvariantViolationSnafu {
                stage: "memory-store-set",
                details: "memory store lock poisoned".to_string(),
            }
            .fail();
        };
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_overwrites_previous_value() {
        let store = MemoryStore::new();
        assert_eq!(store.get("history").unwrap(), None);

        store.set("history", "[]").unwrap();
        store.set("history", "[1]").unwrap();

        assert_eq!(store.get("history").unwrap().as_deref(), Some("[1]"));
        assert_eq!(store.get("other").unwrap(), None);
    }

    #[test]
    fn with_entry_seeds_value() {
        let store = MemoryStore::with_entry("history", "seed");
        assert_eq!(store.get("history").unwrap().as_deref(), Some("seed"));
    }
}
