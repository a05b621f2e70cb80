//! Key-value storage seam backing the session store.
//!
//! Two storage scopes exist at runtime: a durable scope that survives
//! restarts (credential cache, active-store pointer) and a tab scope that
//! lives only as long as the embedding surface (active-session mirror,
//! flash notice). Both are plain string maps behind the same trait so the
//! session store never cares which is which.
//!
//! ## Design
//! - Callers never observe partial writes or storage errors: each call is
//!   one atomic operation, and failures are logged and swallowed so the app
//!   degrades to "no cached data" instead of crashing.
//! - `JsonFileStore` rewrites the whole map through a temp-file rename, so
//!   a crash mid-write never leaves a torn file behind.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;

/// String key-value storage with atomic per-call semantics.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory store. Backs the tab scope and most tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}

/// Write-through JSON file store. Backs the durable scope.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl JsonFileStore {
    /// Open the store at `path`, loading any existing map.
    ///
    /// A missing or unparseable file degrades to an empty map.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(map) => map,
                Err(err) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %err,
                        "Persisted store unreadable, starting empty"
                    );
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn persist(&self, entries: &HashMap<String, String>) -> anyhow::Result<()> {
        let raw = serde_json::to_string(entries)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        if let Err(err) = self.persist(&entries) {
            tracing::warn!(path = %self.path.display(), error = %err, "Failed to persist store");
        }
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            if let Err(err) = self.persist(&entries) {
                tracing::warn!(path = %self.path.display(), error = %err, "Failed to persist store");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_store_set_get_remove() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k"), None);

        store.set("k", "v1");
        assert_eq!(store.get("k"), Some("v1".to_string()));

        store.set("k", "v2");
        assert_eq!(store.get("k"), Some("v2".to_string()));

        store.remove("k");
        assert_eq!(store.get("k"), None);

        // Removing an absent key is a no-op.
        store.remove("k");
    }

    #[test]
    fn file_store_persists_across_instances() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store.json");

        {
            let store = JsonFileStore::new(&path);
            store.set("alpha", "1");
            store.set("beta", "2");
            store.remove("alpha");
        }

        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.get("alpha"), None);
        assert_eq!(reopened.get("beta"), Some("2".to_string()));
    }

    #[test]
    fn file_store_missing_file_starts_empty() {
        let tmp = TempDir::new().unwrap();
        let store = JsonFileStore::new(tmp.path().join("nope.json"));
        assert_eq!(store.get("anything"), None);
    }

    #[test]
    fn file_store_corrupt_file_degrades_to_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("store.json");
        std::fs::write(&path, "{this is not json").unwrap();

        let store = JsonFileStore::new(&path);
        assert_eq!(store.get("anything"), None);

        // And the store is usable again afterwards.
        store.set("k", "v");
        assert_eq!(store.get("k"), Some("v".to_string()));
    }
}
