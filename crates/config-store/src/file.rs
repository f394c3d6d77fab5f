//! JSON-file backed configuration store.

use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use serde_json::{Map, Value};
use tracing::debug;

use crate::store::{ConfigStore, StoreError};

/// Configuration store persisted as a single JSON object.
///
/// Values are cached in memory and the whole object is rewritten on every
/// `set`.
pub struct JsonFileStore {
    path: PathBuf,
    values: RwLock<Map<String, Value>>,
}

impl JsonFileStore {
    /// Opens the store, loading existing values from disk.
    pub fn open(path: PathBuf) -> Result<Self, StoreError> {
        let values = load_values(&path)?;
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes the current values to disk.
    fn persist(&self, values: &Map<String, Value>) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(values)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, json)?;

        // The store may hold the import token.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
        }

        debug!("persisted {} key(s) to {:?}", values.len(), self.path);
        Ok(())
    }
}

impl ConfigStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Writes to disk first; the cached value only changes if that succeeds.
    fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let mut map = self.values.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = map.clone();
        next.insert(key.to_string(), value);
        self.persist(&next)?;
        *map = next;
        Ok(())
    }
}

/// Loads values from a JSON file on disk.
fn load_values(path: &Path) -> Result<Map<String, Value>, StoreError> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let data = std::fs::read_to_string(path)?;
    let values = match serde_json::from_str::<Value>(&data)? {
        Value::Object(map) => map,
        _ => return Err(StoreError::NotAnObject),
    };
    debug!("loaded {} key(s) from {:?}", values.len(), path);
    Ok(values)
}

/// Returns the default store path.
pub fn default_store_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("distro").join("config.json"))
}

/// Returns the platform-specific config directory.
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
    }

    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        std::env::var("HOME")
            .ok()
            .map(|h| PathBuf::from(h).join(".config"))
    }
}
