use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::api::{ClientError, Result};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
pub const THEME_KEY: &str = "theme";
pub const SIDEBAR_COLLAPSED_KEY: &str = "sidebarCollapsed";

const STORE_FILE: &str = "store.json";

/// Persisted string key/value state, kept in one JSON file under the data
/// directory. Every write rewrites the file through a temp file + rename.
pub struct LocalStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl LocalStore {
    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)?;
        let path = data_dir.join(STORE_FILE);

        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), "Ignoring unreadable store: {}", e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: impl Into<String>) -> Result<()> {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.into());
        self.flush(&entries)
    }

    /// Set several keys in one write.
    pub fn set_many(&self, pairs: &[(&str, String)]) -> Result<()> {
        let mut entries = self.entries.lock();
        for (key, value) in pairs {
            entries.insert((*key).to_string(), value.clone());
        }
        self.flush(&entries)
    }

    pub fn remove(&self, keys: &[&str]) -> Result<()> {
        let mut entries = self.entries.lock();
        let mut changed = false;
        for key in keys {
            changed |= entries.remove(*key).is_some();
        }
        if changed {
            self.flush(&entries)?;
        }
        Ok(())
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| ClientError::Store(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
