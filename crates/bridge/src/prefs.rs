use crate::PrefsStore;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

/// Panel preferences persisted as one flat JSON object on disk
/// (`{"<storage key>": "<json blob>", ...}`), mirroring the browser-local
/// storage the host UI uses. Both paths are best-effort: any I/O or parse
/// failure is logged at debug and otherwise ignored.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_map(&self) -> Map<String, Value> {
        match fs::read_to_string(&self.path) {
            Ok(text) => match serde_json::from_str::<Map<String, Value>>(&text) {
                Ok(map) => map,
                Err(e) => {
                    tracing::debug!(path = %self.path.display(), error = %e, "Ignoring corrupt prefs file.");
                    Map::new()
                }
            },
            Err(_) => Map::new(),
        }
    }
}

impl PrefsStore for JsonFileStore {
    fn load(&self, key: &str) -> Option<String> {
        self.read_map()
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn save(&self, key: &str, value: &str) {
        let mut map = self.read_map();
        map.insert(key.to_string(), Value::String(value.to_string()));
        let serialized = match serde_json::to_string_pretty(&Value::Object(map)) {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!(error = %e, "Failed to serialize prefs; skipping save.");
                return;
            }
        };
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Err(e) = fs::write(&self.path, serialized) {
            tracing::debug!(path = %self.path.display(), error = %e, "Failed to write prefs; skipping save.");
        }
    }
}

/// In-memory store for tests and fully offline sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl PrefsStore for MemoryStore {
    fn load(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .ok()
            .and_then(|map| map.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) {
        if let Ok(mut map) = self.entries.lock() {
            map.insert(key.to_string(), value.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips_a_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("prefs.json"));
        assert_eq!(store.load("glass.panels.changes.prefs"), None);

        store.save("glass.panels.changes.prefs", r#"{"limit":200}"#);
        assert_eq!(
            store.load("glass.panels.changes.prefs").as_deref(),
            Some(r#"{"limit":200}"#)
        );
    }

    #[test]
    fn file_store_keeps_other_keys_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("prefs.json"));
        store.save("a", "1");
        store.save("b", "2");
        assert_eq!(store.load("a").as_deref(), Some("1"));
        assert_eq!(store.load("b").as_deref(), Some("2"));
    }

    #[test]
    fn corrupt_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "not json at all").unwrap();

        let store = JsonFileStore::new(&path);
        assert_eq!(store.load("anything"), None);
        // Saving over a corrupt file recovers it.
        store.save("k", "v");
        assert_eq!(store.load("k").as_deref(), Some("v"));
    }

    #[test]
    fn missing_parent_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested/deep/prefs.json"));
        store.save("k", "v");
        assert_eq!(store.load("k").as_deref(), Some("v"));
    }

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::default();
        store.save("k", "v");
        assert_eq!(store.load("k").as_deref(), Some("v"));
        assert_eq!(store.load("other"), None);
    }
}
