// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable key-value storage.
//!
//! Two implementations:
//! - `MemoryStore` for tests and ephemeral sessions
//! - `FileStore`, a single JSON object on disk, for the CLI

use crate::error::AppError;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Durable string key-value storage.
///
/// Writes and deletes are idempotent.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), AppError>;
    fn delete(&self, key: &str) -> Result<(), AppError>;
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), AppError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// File-backed store: all keys live in one JSON object.
///
/// The file is re-read on every access so that separate processes (one CLI
/// invocation per command) observe each other's writes.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> BTreeMap<String, String> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Failed to read storage file");
                return BTreeMap::new();
            }
        };

        serde_json::from_str(&json).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Storage file is corrupt, ignoring");
            BTreeMap::new()
        })
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| AppError::Storage(e.to_string()))?;
        }

        let json =
            serde_json::to_string_pretty(entries).map_err(|e| AppError::Storage(e.to_string()))?;

        // Write then rename so a crash never leaves a truncated file.
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|e| AppError::Storage(e.to_string()))?;
        fs::rename(&tmp, &self.path).map_err(|e| AppError::Storage(e.to_string()))?;
        Ok(())
    }

    fn update<F: FnOnce(&mut BTreeMap<String, String>) -> bool>(
        &self,
        f: F,
    ) -> Result<(), AppError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| AppError::Storage("storage lock poisoned".to_string()))?;
        let mut entries = self.load();
        if f(&mut entries) {
            self.save(&entries)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.load().remove(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), AppError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn delete(&self, key: &str) -> Result<(), AppError> {
        self.update(|entries| entries.remove(key).is_some())
    }
}
