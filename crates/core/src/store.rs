//! Session-scoped key-value persistence.
//!
//! The widget never talks to storage directly; it goes through
//! [`StateStore`], so tests can substitute an in-memory store and the
//! front end can decide where the session file lives.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// A session-scoped key-value store.
///
/// Reads and writes are both best-effort: an absent or unreadable value
/// is reported as `None`, and a failed write is logged and dropped. The
/// store must never fail loudly, since persistence is an optimization,
/// not a correctness requirement.
pub trait StateStore {
    /// Reads the value for a key.
    fn get(&self, key: &str) -> Option<String>;

    /// Writes the value for a key.
    fn set(&self, key: &str, value: &str);
}

/// An in-memory store, mainly for tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<HashMap<String, String>>>,
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .expect("store state is poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .expect("store state is poisoned")
            .insert(key.to_owned(), value.to_owned());
    }
}

/// A store backed by a single JSON object file.
///
/// Every `set` rewrites the whole file. That is fine at the scale of a
/// chat transcript and keeps the on-disk format trivially inspectable.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a store that persists to the given file.
    ///
    /// The file does not need to exist; it is created on the first write.
    #[inline]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> HashMap<String, String> {
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return HashMap::new();
        };
        match serde_json::from_str(&raw) {
            Ok(values) => values,
            Err(err) => {
                warn!("discarding unreadable state file: {err}");
                HashMap::new()
            }
        }
    }
}

impl StateStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self.read_all();
        values.insert(key.to_owned(), value.to_owned());
        let encoded = match serde_json::to_string(&values) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!("failed to encode state: {err}");
                return;
            }
        };
        if let Err(err) = fs::write(&self.path, encoded) {
            warn!("failed to persist state: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryStore::default();
        assert_eq!(store.get("k"), None);
        store.set("k", "v");
        assert_eq!(store.get("k").as_deref(), Some("v"));

        // Clones share the same underlying values.
        let clone = store.clone();
        clone.set("k", "v2");
        assert_eq!(store.get("k").as_deref(), Some("v2"));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("state.json"));

        assert_eq!(store.get("visible"), None);
        store.set("visible", "true");
        store.set("transcript", "[]");
        assert_eq!(store.get("visible").as_deref(), Some("true"));

        // A fresh store over the same file sees the same values.
        let reopened = FileStore::new(dir.path().join("state.json"));
        assert_eq!(reopened.get("transcript").as_deref(), Some("[]"));
    }

    #[test]
    fn test_file_store_ignores_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        let store = FileStore::new(&path);
        assert_eq!(store.get("k"), None);

        // Writing replaces the corrupt file.
        store.set("k", "v");
        assert_eq!(store.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn test_file_store_write_failure_is_silent() {
        // A path whose parent does not exist cannot be written.
        let store = FileStore::new("/nonexistent-dir/state.json");
        store.set("k", "v");
        assert_eq!(store.get("k"), None);
    }
}
