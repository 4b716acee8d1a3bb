use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
#[cfg(unix)]
use std::{io::Write, os::unix::fs::OpenOptionsExt};

use tracing::warn;

use crate::error::StorageError;

/// Durable string key-value storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

fn secure_write(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Target is only ever replaced whole, via rename.
    let tmp = path.with_extension("json.tmp");

    #[cfg(unix)]
    {
        std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&tmp)?
            .write_all(content.as_bytes())?;
    }

    #[cfg(not(unix))]
    {
        std::fs::write(&tmp, content)?;
    }

    std::fs::rename(&tmp, path)
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path)?;
        match String::from_utf8(bytes) {
            Ok(raw) => Ok(Some(raw)),
            // Handed on lossily; the caller decides whether the payload is usable.
            Err(e) => {
                warn!(path = %path.display(), "Stored payload is not valid UTF-8");
                Ok(Some(String::from_utf8_lossy(e.as_bytes()).into_owned()))
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        secure_write(&self.path_for(key), value)?;
        Ok(())
    }
}

const NO_QUOTA: usize = usize::MAX;

/// In-memory store with an optional byte quota. Clones share contents and quota.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    quota: Arc<AtomicUsize>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            entries: Arc::default(),
            quota: Arc::new(AtomicUsize::new(NO_QUOTA)),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        let store = Self::default();
        store.set_quota(Some(quota));
        store
    }

    pub fn set_quota(&self, quota: Option<usize>) {
        self.quota.store(quota.unwrap_or(NO_QUOTA), Ordering::Relaxed);
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.raw(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let quota = self.quota.load(Ordering::Relaxed);
        let mut entries = self.lock();
        if quota != NO_QUOTA {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
