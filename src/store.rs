//! Token storage for the taskman SDK
//!
//! A small persisted key/value map. Every process pointed at the same storage
//! path sees the same session. Writes replace the file atomically, so a
//! reader sees either the old contents or the new ones.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, warn};

use crate::error::{Result, TaskmanError};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Set after a login with a temporary password until the password is changed
pub const TEMP_PASSWORD_KEY: &str = "temp_password_used";

const SESSION_FILE: &str = "session.json";

/// Token storage configuration
#[derive(Debug, Clone, Default)]
pub struct TokenStoreConfig {
    pub enabled: bool,
    pub storage_path: Option<PathBuf>,
}

impl TokenStoreConfig {
    /// Persist under `dir/session.json`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            enabled: true,
            storage_path: Some(dir.as_ref().join(SESSION_FILE)),
        }
    }
}

/// Token storage manager
///
/// A disabled store behaves like a context without storage: reads return
/// nothing and writes are accepted and dropped.
#[derive(Debug)]
pub struct TokenStore {
    config: TokenStoreConfig,
    entries: RwLock<BTreeMap<String, String>>,
}

impl TokenStore {
    /// Open the store, loading whatever is already persisted
    pub fn open(config: TokenStoreConfig) -> Result<Self> {
        let store = Self {
            config,
            entries: RwLock::new(BTreeMap::new()),
        };

        if store.is_enabled() {
            let loaded = store.read_file()?;
            *store.write_entries() = loaded;
        }

        Ok(store)
    }

    /// Enabled store that lives only as long as the process
    pub fn in_memory() -> Self {
        Self {
            config: TokenStoreConfig {
                enabled: true,
                storage_path: None,
            },
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    /// Store without a storage context
    pub fn disabled() -> Self {
        Self {
            config: TokenStoreConfig::default(),
            entries: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn storage_path(&self) -> Option<&Path> {
        self.config.storage_path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if !self.is_enabled() {
            return None;
        }
        self.read_entries().get(key).cloned()
    }

    pub fn set(&self, key: &str, value: impl Into<String>) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let mut entries = self.write_entries();
        entries.insert(key.to_string(), value.into());
        self.save(&entries)
    }

    pub fn remove(&self, keys: &[&str]) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let mut entries = self.write_entries();
        let before = entries.len();
        for key in keys {
            entries.remove(*key);
        }
        if entries.len() == before {
            return Ok(());
        }
        self.save(&entries)
    }

    pub fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY)
    }

    pub fn has_tokens(&self) -> bool {
        self.access_token().is_some() || self.refresh_token().is_some()
    }

    /// Replace the access token and, when given, the refresh token in one write
    pub fn store_tokens(&self, access: &str, refresh: Option<&str>) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let mut entries = self.write_entries();
        entries.insert(ACCESS_TOKEN_KEY.to_string(), access.to_string());
        if let Some(refresh) = refresh {
            entries.insert(REFRESH_TOKEN_KEY.to_string(), refresh.to_string());
        }
        self.save(&entries)
    }

    /// Remove both tokens, leaving other keys alone
    pub fn clear_tokens(&self) -> Result<()> {
        self.remove(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY])
    }

    /// Remove every key
    pub fn clear(&self) -> Result<()> {
        if !self.is_enabled() {
            return Ok(());
        }
        let mut entries = self.write_entries();
        entries.clear();
        self.save(&entries)
    }

    pub fn must_change_password(&self) -> bool {
        self.get(TEMP_PASSWORD_KEY).as_deref() == Some("true")
    }

    pub fn set_must_change_password(&self, required: bool) -> Result<()> {
        if required {
            self.set(TEMP_PASSWORD_KEY, "true")
        } else {
            self.remove(&[TEMP_PASSWORD_KEY])
        }
    }

    /// Re-read the persisted file. Returns whether the contents changed.
    pub fn reload(&self) -> Result<bool> {
        if !self.is_enabled() || self.config.storage_path.is_none() {
            return Ok(false);
        }
        let loaded = self.read_file()?;
        let mut entries = self.write_entries();
        if *entries == loaded {
            return Ok(false);
        }
        debug!("token store changed on disk");
        *entries = loaded;
        Ok(true)
    }

    fn read_entries(&self) -> RwLockReadGuard<'_, BTreeMap<String, String>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_entries(&self) -> RwLockWriteGuard<'_, BTreeMap<String, String>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    fn read_file(&self) -> Result<BTreeMap<String, String>> {
        let Some(path) = &self.config.storage_path else {
            return Ok(BTreeMap::new());
        };

        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| TaskmanError::io_from_error("Failed to read token storage", e))?;

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        // an unreadable session counts as no session
        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                warn!("Ignoring unreadable token storage {}: {}", path.display(), e);
                Ok(BTreeMap::new())
            }
        }
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let Some(path) = &self.config.storage_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                TaskmanError::io_from_error("Failed to create storage directory", e)
            })?;
        }

        let content = serde_json::to_string_pretty(entries)?;
        let staging = staging_path(path);
        fs::write(&staging, content)
            .map_err(|e| TaskmanError::io_from_error("Failed to write token storage", e))?;
        fs::rename(&staging, path).map_err(|e| {
            let _ = fs::remove_file(&staging);
            TaskmanError::io_from_error("Failed to replace token storage", e)
        })?;

        Ok(())
    }
}

/// Sibling of `path` that this process writes before renaming over `path`
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| SESSION_FILE.into());
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}
