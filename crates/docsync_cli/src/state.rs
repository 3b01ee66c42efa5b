//! Application state management

use anyhow::Context;
use docsync::{MetadataCache, OfflineQueue};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use store::{FileStorage, SettingsManager};

/// Offline state opened from a data directory
pub struct AppState {
    pub settings: SettingsManager,
    pub queue: OfflineQueue,
    pub cache: MetadataCache,
}

impl AppState {
    /// Open the settings file, queue, and cache under `data_dir`.
    ///
    /// The queue is attached rather than loaded: the application may be
    /// running over the same directory, so opening never reconciles or
    /// rewrites it.
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        let mut settings = SettingsManager::new(data_dir.to_path_buf());
        // Load settings on startup
        if let Err(e) = settings.load() {
            tracing::warn!("Failed to load settings, using defaults: {}", e);
        }

        let storage_dir = data_dir.join("storage");
        let storage = FileStorage::new(&storage_dir)
            .with_context(|| format!("failed to open storage at {}", storage_dir.display()))?;
        let storage = Arc::new(storage);

        let queue = OfflineQueue::attach(storage.clone(), settings.get());
        let cache = MetadataCache::new(storage, settings.get());
        tracing::debug!(operations = queue.len(), "Opened offline state");

        Ok(Self {
            settings,
            queue,
            cache,
        })
    }
}

/// Default data directory when none is given
pub fn default_data_dir() -> PathBuf {
    std::env::var_os("DOCSYNC_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".docsync"))
}
