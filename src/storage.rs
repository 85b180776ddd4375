//! Key-value persistence standing in for browser local/session storage.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tracing::{debug, error};

use crate::config::StorageConfig;
use crate::error::{ForgeError, Result};

/// Saved history list.
pub const HISTORY_KEY: &str = "adCreativeHistory";
/// Raw credential string, in both the durable and the session store.
pub const API_KEY_KEY: &str = "geminiApiKey";
/// Live editing session carried between CLI invocations.
pub const WORKSPACE_KEY: &str = "workspace";

/// A string-to-string store with whole-value reads and writes.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// One file per key under a directory; writes go through a temp file and a rename.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store scoped to the current login session, kept under the OS temp dir.
    pub fn session_scoped() -> Self {
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "default".to_string());
        Self::new(std::env::temp_dir().join(format!("adforge-session-{}", sanitize(&user))))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize(key)))
    }
}

fn sanitize(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn storage_error(action: &str, path: &Path, e: std::io::Error) -> ForgeError {
    ForgeError::Storage(format!("failed to {action} {}: {e}", path.display()))
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(storage_error("read", &path, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| storage_error("create", &self.dir, e))?;
        let path = self.path_for(key);
        let temp_path = path.with_extension("json.tmp");

        std::fs::write(&temp_path, value.as_bytes())
            .map_err(|e| storage_error("write", &temp_path, e))?;
        std::fs::rename(&temp_path, &path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            error!(from = %temp_path.display(), to = %path.display(), error = %e, "rename failed");
            storage_error("replace", &path, e)
        })?;

        debug!(key, bytes = value.len(), path = %path.display(), "stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_error("remove", &path, e)),
        }
    }
}

/// In-process store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Arc<dyn KeyValueStore> {
        Arc::new(Self::new())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| ForgeError::Storage("memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// The durable and the session-scoped stores used by one process.
#[derive(Clone)]
pub struct Stores {
    pub durable: Arc<dyn KeyValueStore>,
    pub session: Arc<dyn KeyValueStore>,
}

impl Stores {
    pub fn on_disk(data_dir: &Path) -> Self {
        Self {
            durable: Arc::new(FileStore::new(data_dir)),
            session: Arc::new(FileStore::session_scoped()),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        let session = match &config.session_dir {
            Some(dir) => FileStore::new(dir),
            None => FileStore::session_scoped(),
        };
        Self {
            durable: Arc::new(FileStore::new(&config.data_dir)),
            session: Arc::new(session),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            durable: MemoryStore::shared(),
            session: MemoryStore::shared(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_round_trips_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("nested"));

        assert_eq!(store.get(HISTORY_KEY).unwrap(), None);
        store.set(HISTORY_KEY, "[]").unwrap();
        assert_eq!(store.get(HISTORY_KEY).unwrap().as_deref(), Some("[]"));
        assert!(!dir.path().join("nested").join("adCreativeHistory.json.tmp").exists());

        store.remove(HISTORY_KEY).unwrap();
        assert_eq!(store.get(HISTORY_KEY).unwrap(), None);
        store.remove(HISTORY_KEY).unwrap();
    }

    #[test]
    fn file_store_keys_cannot_escape_the_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.set("../outside", "x").unwrap();
        assert!(dir.path().join("___outside.json").exists());
    }

    #[test]
    fn memory_store_overwrites() {
        let store = MemoryStore::new();
        store.set(API_KEY_KEY, "a").unwrap();
        store.set(API_KEY_KEY, "b").unwrap();
        assert_eq!(store.get(API_KEY_KEY).unwrap().as_deref(), Some("b"));
    }
}
