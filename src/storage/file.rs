//! JSON-file backed credential store
//!
//! The whole map is rewritten on every mutation through a temp file and a
//! rename, so a crash never leaves a half-written credentials file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use directories::ProjectDirs;
use tracing::{debug, warn};

use super::CredentialStore;
use crate::errors::{AppError, AppResult, ErrorContext, ErrorContextExt};

const CREDENTIALS_FILE: &str = "credentials.json";

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Open (or lazily create) the store at `path`
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let values = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| AppError::io_with_source(&path, "read credentials file", e))?;
            if content.trim().is_empty() {
                HashMap::new()
            } else {
                match serde_json::from_str(&content) {
                    Ok(values) => values,
                    Err(e) => {
                        warn!("Credentials file {:?} is unreadable, starting empty: {}", path, e);
                        HashMap::new()
                    }
                }
            }
        } else {
            HashMap::new()
        };

        debug!("Opened credential store at {:?} ({} keys)", path, values.len());

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Default location inside the platform data directory
    pub fn default_path() -> AppResult<PathBuf> {
        let dirs = ProjectDirs::from("com", "engage", "engage-client")
            .ok_or_else(|| AppError::config("Failed to resolve data directory"))?;
        Ok(dirs.data_dir().join(CREDENTIALS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, key: &str, values: &HashMap<String, String>) -> AppResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| AppError::io_with_source(parent, "create credentials directory", e))?;
        }

        let content = serde_json::to_string_pretty(values)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).with_error_context(
            ErrorContext::new("writing credentials")
                .with_component("storage")
                .with_additional_info(format!("key: {}", key)),
        )?;
        fs::rename(&tmp, &self.path).map_err(|e| AppError::storage_with_source(key, "rename", e))?;
        Ok(())
    }
}

impl CredentialStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = values.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(key, &next)?;
        *values = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        if !values.contains_key(key) {
            return Ok(());
        }
        let mut next = values.clone();
        next.remove(key);
        self.persist(key, &next)?;
        *values = next;
        Ok(())
    }

    /// One rewrite for all keys; memory is cleared even when the disk is not
    fn remove_all(&self, keys: &[&str]) -> AppResult<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        if !keys.iter().any(|key| values.contains_key(*key)) {
            return Ok(());
        }
        for key in keys {
            values.remove(*key);
        }

        let label = keys.join(",");
        match self.persist(&label, &values) {
            Ok(()) => Ok(()),
            // Nothing else to keep, so dropping the file clears the disk too
            Err(e) if values.is_empty() => {
                warn!("Rewriting {:?} failed ({}), removing it", self.path, e);
                fs::remove_file(&self.path)
                    .map_err(|e| AppError::io_with_source(&self.path, "remove credentials file", e))
            }
            Err(e) => Err(e),
        }
    }
}
