//! Key-value persistence for user preferences, the watchlist and alerts.
//!
//! Reads never fail: a missing file, unreadable JSON or a value of the wrong
//! shape all fall back to the type's default.

use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{DashboardError, Result};

pub const KEY_THEME: &str = "theme";
pub const KEY_LANGUAGE: &str = "language";
pub const KEY_WATCHLIST: &str = "watchlist";
pub const KEY_ALERTS: &str = "alerts";
pub const KEY_CONSENT: &str = "consent";
pub const KEY_NOTIFICATION_PERMISSION: &str = "notification_permission";

pub trait Storage: Send {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value) -> Result<()>;
}

/// Reads `key` as `T`, falling back to `T::default()` when the key is absent
/// or holds something that does not parse.
pub fn load_or_default<T: DeserializeOwned + Default>(storage: &dyn Storage, key: &str) -> T {
    match storage.get(key) {
        None => T::default(),
        Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
            warn!("Ignoring malformed stored value for '{}': {}", key, e);
            T::default()
        }),
    }
}

/// Serializes and stores `value`, logging instead of failing so that a
/// read-only disk never blocks a user action.
pub fn save<T: Serialize>(storage: &mut dyn Storage, key: &str, value: &T) {
    let result = serde_json::to_value(value)
        .map_err(DashboardError::from)
        .and_then(|v| storage.set(key, v));
    if let Err(e) = result {
        warn!("Failed to persist '{}': {}", key, e);
    }
}

/// A JSON object on disk, rewritten in full on every `set`.
pub struct FileStorage {
    path: PathBuf,
    entries: Map<String, Value>,
}

impl FileStorage {
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => map,
                Ok(_) | Err(_) => {
                    warn!(
                        "State file {} is not a JSON object, starting fresh",
                        path.display()
                    );
                    Map::new()
                }
            },
            Err(e) => {
                debug!("No state file at {} ({})", path.display(), e);
                Map::new()
            }
        };

        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let text = serde_json::to_string_pretty(&self.entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        self.flush()
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    entries: HashMap<String, Value>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}
