//! Application settings management
//!
//! This module provides settings persistence, loading, and updating
//! for the offline document sync layer.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage key of the pending document operation queue
pub const DEFAULT_QUEUE_KEY: &str = "documents_offline_queue";

/// Storage key of the document listing cache
pub const DEFAULT_CACHE_KEY: &str = "documents_metadata_cache";

/// Main application settings container
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    /// Offline queue and sync behaviour
    pub offline: OfflineSettings,
    /// Durable storage layout
    pub storage: StorageSettings,
}

/// Offline queue and sync settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OfflineSettings {
    /// Delay after a sync pass before succeeded operations are dropped (ms)
    pub cleanup_delay_ms: u64,
    /// Largest document body accepted into the offline queue, in raw bytes.
    ///
    /// Queued bodies are stored base64-encoded, which grows them by a third,
    /// so the persisted queue needs roughly `4/3 * max_upload_bytes` per upload.
    pub max_upload_bytes: usize,
    /// Whether operations left `Syncing` by an abnormal exit go back to `Pending` on load
    pub reset_syncing_on_load: bool,
}

impl Default for OfflineSettings {
    fn default() -> Self {
        Self {
            cleanup_delay_ms: 2000,
            max_upload_bytes: 2 * 1024 * 1024, // 2 MiB
            reset_syncing_on_load: true,
        }
    }
}

/// Durable storage settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageSettings {
    /// Key holding the operation queue
    pub queue_key: String,
    /// Key holding the document listing cache
    pub cache_key: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            queue_key: DEFAULT_QUEUE_KEY.to_string(),
            cache_key: DEFAULT_CACHE_KEY.to_string(),
        }
    }
}

/// Settings manager for loading, saving, and updating application settings
pub struct SettingsManager {
    /// Path to the settings file
    settings_path: PathBuf,
    /// Current settings (cached)
    current: AppSettings,
}

impl SettingsManager {
    /// Create a new settings manager with the given app data directory
    pub fn new(app_data_dir: PathBuf) -> Self {
        let settings_path = app_data_dir.join("settings.json");
        Self {
            settings_path,
            current: AppSettings::default(),
        }
    }

    /// Get the path to the settings file
    pub fn settings_path(&self) -> &PathBuf {
        &self.settings_path
    }

    /// Load settings from disk, or return defaults if the file doesn't exist
    pub fn load(&mut self) -> Result<&AppSettings> {
        if self.settings_path.exists() {
            let content = std::fs::read_to_string(&self.settings_path)?;
            match serde_json::from_str::<AppSettings>(&content) {
                Ok(settings) => {
                    self.current = settings;
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse settings file, using defaults: {}",
                        e
                    );
                    self.current = AppSettings::default();
                }
            }
        } else {
            self.current = AppSettings::default();
        }
        Ok(&self.current)
    }

    /// Save current settings to disk
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.settings_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(&self.current)?;
        std::fs::write(&self.settings_path, content)?;
        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> &AppSettings {
        &self.current
    }

    /// Update settings and save to disk
    pub fn update(&mut self, settings: AppSettings) -> Result<()> {
        self.current = settings;
        self.save()
    }

    /// Reset settings to defaults and save
    pub fn reset(&mut self) -> Result<&AppSettings> {
        self.current = AppSettings::default();
        self.save()?;
        Ok(&self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();

        assert_eq!(settings.offline.cleanup_delay_ms, 2000);
        assert_eq!(settings.offline.max_upload_bytes, 2 * 1024 * 1024);
        assert!(settings.offline.reset_syncing_on_load);

        assert_eq!(settings.storage.queue_key, "documents_offline_queue");
        assert_eq!(settings.storage.cache_key, "documents_metadata_cache");
    }

    #[test]
    fn test_settings_serialization_roundtrip() {
        let settings = AppSettings::default();
        let json = serde_json::to_string_pretty(&settings).unwrap();
        let parsed: AppSettings = serde_json::from_str(&json).unwrap();
        assert_eq!(settings, parsed);
    }

    #[test]
    fn test_partial_settings_fill_defaults() {
        let parsed: AppSettings =
            serde_json::from_str(r#"{"offline": {"cleanup_delay_ms": 500}}"#).unwrap();
        assert_eq!(parsed.offline.cleanup_delay_ms, 500);
        assert_eq!(parsed.offline.max_upload_bytes, 2 * 1024 * 1024);
        assert_eq!(parsed.storage, StorageSettings::default());
    }

    #[test]
    fn test_settings_manager_load_save() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::new(temp_dir.path().to_path_buf());

        // Load should return defaults when no file exists
        let settings = manager.load().unwrap();
        assert_eq!(settings, &AppSettings::default());

        let mut new_settings = AppSettings::default();
        new_settings.offline.cleanup_delay_ms = 10;
        new_settings.storage.queue_key = "queue".to_string();
        manager.update(new_settings).unwrap();

        let mut manager2 = SettingsManager::new(temp_dir.path().to_path_buf());
        let loaded = manager2.load().unwrap();
        assert_eq!(loaded.offline.cleanup_delay_ms, 10);
        assert_eq!(loaded.storage.queue_key, "queue");
    }

    #[test]
    fn test_settings_manager_corrupt_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("settings.json"), "{ not json").unwrap();

        let mut manager = SettingsManager::new(temp_dir.path().to_path_buf());
        let settings = manager.load().unwrap();
        assert_eq!(settings, &AppSettings::default());
    }

    #[test]
    fn test_settings_manager_reset() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::new(temp_dir.path().to_path_buf());

        let mut new_settings = AppSettings::default();
        new_settings.offline.max_upload_bytes = 1;
        manager.update(new_settings).unwrap();

        let settings = manager.reset().unwrap();
        assert_eq!(settings.offline.max_upload_bytes, 2 * 1024 * 1024);
    }
}
