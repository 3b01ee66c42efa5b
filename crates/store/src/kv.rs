//! Durable key/value text storage.
//!
//! Offline state (the pending operation queue, the document listing cache) is
//! mirrored into a small text store addressed by string keys. Two backends are
//! provided:
//!
//! - [`MemoryStorage`]: process-local, for tests and development
//! - [`FileStorage`]: one file per key inside a data directory
//!
//! Both accept an optional per-value size quota so that callers hit an explicit
//! [`StoreError::QuotaExceeded`] instead of a silent platform ceiling.
//!
//! # Example
//!
//! ```
//! use store::{DurableStorage, MemoryStorage};
//!
//! let storage = MemoryStorage::new();
//! storage.write("greeting", "hello").unwrap();
//! assert_eq!(storage.read("greeting").unwrap().as_deref(), Some("hello"));
//! ```

use crate::{Result, StoreError};
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Extension used for files written by [`FileStorage`]
const VALUE_EXTENSION: &str = "json";

/// Trait for durable text storage backends
///
/// Methods take `&self`; implementations use interior locking so a single
/// store can be shared behind an `Arc`.
pub trait DurableStorage: Send + Sync {
    /// Read the value stored under `key`, or `None` if nothing is stored.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Overwrite the value stored under `key`.
    fn write(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the value stored under `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

impl<S: DurableStorage + ?Sized> DurableStorage for std::sync::Arc<S> {
    fn read(&self, key: &str) -> Result<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

fn check_quota(key: &str, value: &str, quota: Option<usize>) -> Result<()> {
    match quota {
        Some(limit) if value.len() > limit => Err(StoreError::QuotaExceeded {
            key: key.to_string(),
            len: value.len(),
            limit,
        }),
        _ => Ok(()),
    }
}

/// In-memory implementation of [`DurableStorage`]
///
/// Nothing survives the process; "restarts" in tests are simulated by
/// building a fresh consumer over the same storage instance.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: RwLock<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    /// Create a new empty store without a quota
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that rejects values larger than `quota` bytes
    pub fn with_quota(quota: usize) -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            quota: Some(quota),
        }
    }

    /// Number of keys currently stored
    pub fn len(&self) -> usize {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the store holds no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DurableStorage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        check_quota(key, value, self.quota)?;
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// File-backed implementation of [`DurableStorage`]
///
/// ```text
/// data/
/// ├── documents_offline_queue.json
/// └── documents_metadata_cache.json
/// ```
///
/// Writes go to a temporary sibling file which is then renamed over the
/// target, so a crash mid-write leaves either the old or the new value.
pub struct FileStorage {
    base_path: PathBuf,
    quota: Option<usize>,
    /// Serializes writers within this process
    write_lock: RwLock<()>,
}

impl FileStorage {
    /// Create a file store rooted at `base_path`, creating the directory if needed
    pub fn new(base_path: impl AsRef<Path>) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path)?;
        Ok(Self {
            base_path,
            quota: None,
            write_lock: RwLock::new(()),
        })
    }

    /// Reject values larger than `quota` bytes
    pub fn with_quota(mut self, quota: usize) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Directory holding the stored values
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn value_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
            && !key.starts_with('.');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.base_path.join(format!("{key}.{VALUE_EXTENSION}")))
    }
}

impl DurableStorage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.value_path(key)?;
        let _guard = self.write_lock.read().unwrap_or_else(PoisonError::into_inner);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<()> {
        let path = self.value_path(key)?;
        check_quota(key, value, self.quota)?;

        let _guard = self.write_lock.write().unwrap_or_else(PoisonError::into_inner);
        let tmp_path = path.with_extension(format!("{VALUE_EXTENSION}.tmp"));
        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &path)?;
        tracing::debug!(key, bytes = value.len(), "Persisted storage value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.value_path(key)?;
        let _guard = self.write_lock.write().unwrap_or_else(PoisonError::into_inner);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
