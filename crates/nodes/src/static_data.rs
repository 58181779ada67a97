//! Node-scoped durable storage.
//!
//! Trigger nodes keep small pieces of state between lifecycle calls (for
//! example the id and secret of a remote webhook registration). The host owns
//! the storage; nodes only see the [`StaticData`] trait.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::debug;

use crate::NodeError;

/// Key-value storage scoped to a single node of a single workflow.
pub trait StaticData: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String) -> Result<(), NodeError>;
    fn remove(&self, key: &str) -> Result<(), NodeError>;
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Process-local storage. Lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStaticData {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStaticData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl StaticData for MemoryStaticData {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<(), NodeError> {
        self.entries.lock().insert(key.to_owned(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), NodeError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// JSON file
// ---------------------------------------------------------------------------

/// Storage persisted as a flat JSON object on disk.
///
/// The whole file is rewritten after every mutation, so a registration made
/// before a restart is still known afterwards.
#[derive(Debug)]
pub struct JsonFileStaticData {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl JsonFileStaticData {
    /// Open (or lazily create) the store at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, NodeError> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| NodeError::Storage(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(NodeError::Storage(format!("{}: {e}", path.display()))),
        };
        debug!(path = %path.display(), keys = entries.len(), "opened static data file");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), NodeError> {
        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| NodeError::Storage(e.to_string()))?;
        std::fs::write(&self.path, content)
            .map_err(|e| NodeError::Storage(format!("{}: {e}", self.path.display())))
    }
}

impl StaticData for JsonFileStaticData {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<(), NodeError> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_owned(), value);
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), NodeError> {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("static-data-{}.json", uuid::Uuid::new_v4()))
    }

    #[test]
    fn memory_store_round_trips_and_removes() {
        let store = MemoryStaticData::new();
        store.set("webhookId", "wh_1".into()).unwrap();
        assert_eq!(store.get("webhookId").as_deref(), Some("wh_1"));

        store.remove("webhookId").unwrap();
        assert!(store.get("webhookId").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn file_store_survives_reopen() {
        let path = temp_path();
        {
            let store = JsonFileStaticData::open(&path).unwrap();
            store.set("webhookId", "wh_1".into()).unwrap();
            store.set("webhookSecret", "s3cr3t".into()).unwrap();
        }

        let reopened = JsonFileStaticData::open(&path).unwrap();
        assert_eq!(reopened.get("webhookId").as_deref(), Some("wh_1"));
        assert_eq!(reopened.get("webhookSecret").as_deref(), Some("s3cr3t"));

        reopened.remove("webhookId").unwrap();
        let again = JsonFileStaticData::open(&path).unwrap();
        assert!(again.get("webhookId").is_none());

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn corrupt_file_is_a_storage_error() {
        let path = temp_path();
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            JsonFileStaticData::open(&path),
            Err(NodeError::Storage(_))
        ));
        let _ = std::fs::remove_file(path);
    }
}
