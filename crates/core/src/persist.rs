//! Persisted state layout.
//!
//! Only the column definitions survive a restart. They are stored as one
//! JSON document under a single namespaced key of a generic key-value store.
//! Rows and query state are never written.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::schema::Column;

/// Key under which the column list is stored.
pub const COLUMNS_KEY: &str = "tabula:columns";

/// Layout version written with every snapshot.
pub const SCHEMA_SNAPSHOT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Key-value stores
// ---------------------------------------------------------------------------

/// A string key-value store that outlives the process.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError>;
    fn remove(&mut self, key: &str) -> Result<(), CoreError>;
}

/// Process-local store. Used by tests and when no state directory is set.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One file per key inside a directory. Keys are mapped to file names by
/// replacing every character outside `[A-Za-z0-9_-]` with `_`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            CoreError::Storage(format!("cannot create {}: {e}", dir.display()))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CoreError::Storage(format!("cannot read {}: {e}", path.display()))),
        }
    }

    /// Writes to a temporary file first, then renames it into place.
    fn set(&mut self, key: &str, value: &str) -> Result<(), CoreError> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)
            .and_then(|()| std::fs::rename(&tmp, &path))
            .map_err(|e| CoreError::Storage(format!("cannot write {}: {e}", path.display())))
    }

    fn remove(&mut self, key: &str) -> Result<(), CoreError> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CoreError::Storage(format!("cannot remove {}: {e}", path.display()))),
        }
    }
}

// ---------------------------------------------------------------------------
// Column snapshots
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct SchemaSnapshot {
    version: u32,
    columns: Vec<Column>,
}

pub fn save_columns(store: &mut dyn KeyValueStore, columns: &[Column]) -> Result<(), CoreError> {
    let snapshot = SchemaSnapshot {
        version: SCHEMA_SNAPSHOT_VERSION,
        columns: columns.to_vec(),
    };
    let json = serde_json::to_string(&snapshot)
        .map_err(|e| CoreError::Storage(format!("cannot serialize columns: {e}")))?;
    store.set(COLUMNS_KEY, &json)
}

/// Load the saved column list. `Ok(None)` when nothing has been saved yet.
pub fn load_columns(store: &dyn KeyValueStore) -> Result<Option<Vec<Column>>, CoreError> {
    let Some(json) = store.get(COLUMNS_KEY)? else {
        return Ok(None);
    };
    let snapshot: SchemaSnapshot = serde_json::from_str(&json)
        .map_err(|e| CoreError::Storage(format!("corrupt column snapshot: {e}")))?;
    if snapshot.version != SCHEMA_SNAPSHOT_VERSION {
        return Err(CoreError::Storage(format!(
            "unsupported column snapshot version {}",
            snapshot.version
        )));
    }
    Ok(Some(snapshot.columns))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::schema::default_columns;

    #[test]
    fn memory_store_round_trips_columns() {
        let mut store = MemoryStore::new();
        assert_eq!(load_columns(&store).unwrap(), None);
        save_columns(&mut store, &default_columns()).unwrap();
        assert_eq!(load_columns(&store).unwrap(), Some(default_columns()));
    }

    #[test]
    fn file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = FileStore::open(dir.path()).unwrap();
            save_columns(&mut store, &default_columns()[..2]).unwrap();
        }
        let store = FileStore::open(dir.path()).unwrap();
        let columns = load_columns(&store).unwrap().unwrap();
        assert_eq!(columns.len(), 2);
        assert!(dir.path().join("tabula_columns.json").exists());
    }

    #[test]
    fn file_store_missing_and_removed_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        assert_eq!(store.get("absent").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn corrupt_snapshot_is_storage_error() {
        let mut store = MemoryStore::new();
        store.set(COLUMNS_KEY, "{not json").unwrap();
        assert_matches!(load_columns(&store), Err(CoreError::Storage(_)));

        store
            .set(COLUMNS_KEY, r#"{"version":9,"columns":[]}"#)
            .unwrap();
        assert_matches!(load_columns(&store), Err(CoreError::Storage(msg)) if msg.contains("version 9"));
    }
}
