use std::collections::BTreeSet;

use log::{error, warn};

use crate::errors::CoreError;
use crate::storage::KeyValueStore;

/// The user's favorite fund ids, persisted under a single storage key.
///
/// Lifecycle: [`load`](Self::load) once at start-up, then every
/// [`toggle`](Self::toggle) overwrites the stored list with the whole set.
/// Ids are weak references; the registry never checks them against a catalog.
pub struct FavoritesRegistry {
    store: Box<dyn KeyValueStore>,
    key: String,
    ids: BTreeSet<String>,
}

impl FavoritesRegistry {
    /// Read the stored list. A missing, unreadable or malformed entry yields
    /// an empty set; the problem is logged, never returned.
    pub fn load(store: Box<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let ids = match store.read(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(list) => list.into_iter().collect(),
                Err(e) => {
                    warn!(
                        "Ignoring malformed favorites entry '{key}' in {} store: {e}",
                        store.name()
                    );
                    BTreeSet::new()
                }
            },
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                warn!("Could not read favorites entry '{key}' from {} store: {e}", store.name());
                BTreeSet::new()
            }
        };
        Self { store, key, ids }
    }

    /// Flip membership of `id` and persist the full set.
    ///
    /// Returns the new membership. If persisting fails the flip is rolled
    /// back so memory and storage stay in agreement.
    pub fn toggle(&mut self, id: &str) -> Result<bool, CoreError> {
        let now_favorite = if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        };

        if let Err(e) = self.persist() {
            error!("Failed to persist favorites, rolling back toggle of {id}: {e}");
            if now_favorite {
                self.ids.remove(id);
            } else {
                self.ids.insert(id.to_string());
            }
            return Err(e);
        }

        Ok(now_favorite)
    }

    pub fn is_favorite(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn all(&self) -> &BTreeSet<String> {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    fn persist(&self) -> Result<(), CoreError> {
        let list: Vec<&String> = self.ids.iter().collect();
        let json = serde_json::to_string(&list)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize favorites: {e}")))?;
        self.store.write(&self.key, &json)
    }
}

impl std::fmt::Debug for FavoritesRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoritesRegistry")
            .field("store", &self.store.name())
            .field("key", &self.key)
            .field("ids", &self.ids)
            .finish()
    }
}
