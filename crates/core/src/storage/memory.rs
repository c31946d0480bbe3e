use std::collections::HashMap;
use std::sync::Mutex;

use crate::errors::CoreError;

use super::traits::KeyValueStore;

/// In-process store. Contents live as long as the value does.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate one entry (e.g. to simulate what a previous session left behind).
    pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
        let store = Self::new();
        if let Ok(mut entries) = store.entries.lock() {
            entries.insert(key.into(), value.into());
        }
        store
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, CoreError> {
        self.entries
            .lock()
            .map_err(|_| CoreError::Storage("memory store lock poisoned".into()))
    }
}

impl KeyValueStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn read(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), CoreError> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
