use std::{collections::HashMap, fs, path::PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::errors::InterfaceError;

/// Durable client storage holding string values under string keys. Last writer wins.
pub trait KeyValueStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, InterfaceError>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), InterfaceError>;
}

/// Process-local storage, used by tests and by callers without a writable disk.
#[derive(Default)]
pub struct MemoryStorage {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, InterfaceError> {
        Ok(self.items.lock().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), InterfaceError> {
        self.items
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Storage backed by a single JSON object file.
///
/// Every write rewrites the whole file, which is fine for the handful of keys kept here. The new
/// content goes to a sibling file that is renamed over the old one, so readers never see a
/// partial write.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path, lock: Mutex::new(()) }
    }

    /// Storage file in the user's configuration directory.
    pub fn in_config_dir() -> Result<Self, InterfaceError> {
        let dir = dirs::config_dir().ok_or_else(|| {
            InterfaceError::FatalError("Could not determine the configuration directory".to_string())
        })?;
        Ok(Self::new(dir.join(env!("CARGO_PKG_NAME")).join("storage.json")))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>, InterfaceError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

impl KeyValueStorage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, InterfaceError> {
        let _guard = self.lock.lock();
        Ok(self.read_all()?.remove(key))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), InterfaceError> {
        let _guard = self.lock.lock();
        let mut items = match self.read_all() {
            Ok(items) => items,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Discarding unreadable storage file");
                HashMap::new()
            }
        };
        items.insert(key.to_string(), value.to_string());
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, serde_json::to_string_pretty(&items)?)?;
        fs::rename(&staging, &self.path)?;
        debug!(path = %self.path.display(), key, "Stored item");
        Ok(())
    }
}
