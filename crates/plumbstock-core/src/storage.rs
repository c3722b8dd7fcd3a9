//! Key-value backends the item store persists into.
//!
//! A backend is a flat map of string keys to string values, the shape of a
//! browser's local storage. Backends that can see writes from every writer
//! sharing them report those writes through [`KeyValueStorage::watch`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StorageError;

/// A write observed on a shared backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageChange {
    pub key: String,
    /// New value, or `None` when the key was removed.
    pub new_value: Option<String>,
}

/// The trait every persistence backend implements.
pub trait KeyValueStorage: Send + Sync {
    /// Read a value. A missing key is `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing a missing key succeeds.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Subscribe to writes of `key` made by any writer. Backends without
    /// change notification return `None`.
    fn watch(&self, _key: &str) -> Option<Receiver<StorageChange>> {
        None
    }
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn watch(&self, key: &str) -> Option<Receiver<StorageChange>> {
        (**self).watch(key)
    }
}

struct Watcher {
    key: String,
    tx: Sender<StorageChange>,
}

#[derive(Default)]
struct MemoryInner {
    entries: HashMap<String, String>,
    watchers: Vec<Watcher>,
    disabled: bool,
}

/// In-process backend with an optional byte quota.
///
/// Share one instance behind an `Arc` to model several views over the same
/// storage; each sees the others' writes via [`KeyValueStorage::watch`].
#[derive(Default)]
pub struct MemoryStorage {
    inner: Mutex<MemoryInner>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the total bytes of keys plus values.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            inner: Mutex::default(),
            quota: Some(quota),
        }
    }

    /// Make every subsequent call fail as if storage were disabled.
    pub fn set_available(&self, available: bool) {
        if let Ok(mut inner) = self.inner.lock() {
            inner.disabled = !available;
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, MemoryInner>, StorageError> {
        let inner = self
            .inner
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        if inner.disabled {
            return Err(StorageError::Unavailable("storage is disabled".to_string()));
        }
        Ok(inner)
    }

    /// Deliver `change` to the watchers of its key. A watcher whose receiver
    /// is gone is dropped at the next change to its key.
    fn notify(inner: &mut MemoryInner, change: StorageChange) {
        inner
            .watchers
            .retain(|w| w.key != change.key || w.tx.send(change.clone()).is_ok());
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock()?.entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        if let Some(quota) = self.quota {
            let others: usize = inner
                .entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }
        inner.entries.insert(key.to_string(), value.to_string());
        Self::notify(
            &mut inner,
            StorageChange {
                key: key.to_string(),
                new_value: Some(value.to_string()),
            },
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut inner = self.lock()?;
        if inner.entries.remove(key).is_some() {
            Self::notify(
                &mut inner,
                StorageChange {
                    key: key.to_string(),
                    new_value: None,
                },
            );
        }
        Ok(())
    }

    fn watch(&self, key: &str) -> Option<Receiver<StorageChange>> {
        let mut inner = self.inner.lock().ok()?;
        let (tx, rx) = mpsc::channel();
        inner.watchers.push(Watcher {
            key: key.to_string(),
            tx,
        });
        Some(rx)
    }
}

/// Backend keeping one `<key>.json` file per key under a directory.
#[derive(Debug)]
pub struct FileStorage {
    base_path: PathBuf,
    quota: Option<usize>,
}

impl FileStorage {
    /// Open (or create) a storage directory.
    pub fn open<P: AsRef<Path>>(base_path: P) -> Result<Self, StorageError> {
        let base_path = base_path.as_ref().to_path_buf();
        if !base_path.exists() {
            debug!("Creating storage directory {:?}", base_path);
            fs::create_dir_all(&base_path)?;
        }
        Ok(Self {
            base_path,
            quota: None,
        })
    }

    /// Reject single values larger than `quota` bytes.
    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = Some(quota);
        self
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// File for `key`. ASCII letters, digits and `-` are kept; every other
    /// byte becomes `_` plus two hex digits, so distinct keys never share a
    /// file.
    fn path_for(&self, key: &str) -> PathBuf {
        let mut safe = String::with_capacity(key.len());
        for byte in key.bytes() {
            if byte.is_ascii_alphanumeric() || byte == b'-' {
                safe.push(char::from(byte));
            } else {
                safe.push_str(&format!("_{:02x}", byte));
            }
        }
        self.base_path.join(format!("{}.json", safe))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            if value.len() > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed: value.len(),
                    quota,
                });
            }
        }
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
