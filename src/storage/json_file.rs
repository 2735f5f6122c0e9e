use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::DurableStore;
use crate::error::{RecipeStateError, Result};

/// Store backed by a single JSON object file.
///
/// Every write rewrites the whole file through a temp file in the same
/// directory followed by an atomic rename, so an interrupted write never
/// leaves a partial file behind.
pub struct JsonFileStore {
    path: PathBuf,
    entries: Mutex<Map<String, Value>>,
}

impl JsonFileStore {
    /// Open the store at `path`, creating parent directories as needed.
    /// A missing file starts an empty store.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let entries = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            if content.trim().is_empty() {
                Map::new()
            } else {
                match serde_json::from_str::<Value>(&content)? {
                    Value::Object(map) => map,
                    other => {
                        return Err(RecipeStateError::Storage(format!(
                            "Expected a JSON object in {:?}, found {}",
                            path,
                            type_name(&other)
                        )))
                    }
                }
            }
        } else {
            Map::new()
        };

        info!("Opened JSON store at {:?} ({} keys)", path, entries.len());
        Ok(Self {
            path: path.to_path_buf(),
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of the current entries, write it, and only
    /// then replace the in-memory copy.
    fn update(&self, change: impl FnOnce(&mut Map<String, Value>)) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| RecipeStateError::Storage("JSON store lock poisoned".to_string()))?;

        let mut next = entries.clone();
        change(&mut next);
        self.write_atomic(&next)?;
        *entries = next;
        Ok(())
    }

    fn write_atomic(&self, entries: &Map<String, Value>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;

        let parent = self
            .path
            .parent()
            .ok_or_else(|| {
                RecipeStateError::Storage(format!(
                    "Store path has no parent directory: {:?}",
                    self.path
                ))
            })?;

        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(json.as_bytes())?;
        temp.flush()?;
        temp.persist(&self.path).map_err(|e| e.error)?;

        debug!("Wrote {} keys to {:?}", entries.len(), self.path);
        Ok(())
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl DurableStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| RecipeStateError::Storage("JSON store lock poisoned".to_string()))?;
        Ok(entries
            .get(key)
            .and_then(|v| v.as_str().map(|s| s.to_string())))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), Value::String(value.to_string()));
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        {
            let store = JsonFileStore::open(&path).unwrap();
            store.set("username", "alice").unwrap();
            store.set("profilePic", "https://img.example/alice.png").unwrap();
            store.remove("profilePic").unwrap();
        }

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get("username").unwrap(), Some("alice".to_string()));
        assert_eq!(reopened.get("profilePic").unwrap(), None);
    }

    #[test]
    fn test_file_is_a_json_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        let store = JsonFileStore::open(&path).unwrap();
        store.set("mealPlan", "[]").unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["mealPlan"], Value::String("[]".to_string()));
    }

    #[test]
    fn test_empty_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "").unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("username").unwrap(), None);
    }

    #[test]
    fn test_non_object_file_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let result = JsonFileStore::open(&path);
        match result {
            Err(RecipeStateError::Storage(msg)) => assert!(msg.contains("an array"), "{}", msg),
            other => panic!("expected storage error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_non_string_values_read_as_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, r#"{"username": 42}"#).unwrap();

        let store = JsonFileStore::open(&path).unwrap();
        assert_eq!(store.get("username").unwrap(), None);
    }
}
