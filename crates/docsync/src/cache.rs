//! Document listing cache.
//!
//! Keeps the last successful remote listing in durable storage so the
//! document page has something to show while a fetch is in flight or the
//! remote service is unreachable. Never authoritative: every successful fetch
//! overwrites it.

use crate::remote::DocumentRecord;
use std::sync::Arc;
use store::{AppSettings, DurableStorage};

/// Last-known-good snapshot of the document listing
#[derive(Clone)]
pub struct MetadataCache {
    storage: Arc<dyn DurableStorage>,
    key: String,
}

impl MetadataCache {
    /// Create a cache over `storage` using the configured cache key
    pub fn new(storage: Arc<dyn DurableStorage>, settings: &AppSettings) -> Self {
        Self {
            storage,
            key: settings.storage.cache_key.clone(),
        }
    }

    /// The cached listing; empty if nothing is cached or the value is unreadable
    pub fn get(&self) -> Vec<DocumentRecord> {
        let stored = match self.storage.read(&self.key) {
            Ok(Some(stored)) => stored,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!("Failed to read documents cache: {}", e);
                return Vec::new();
            }
        };

        serde_json::from_str(&stored).unwrap_or_else(|e| {
            tracing::warn!("Failed to parse documents cache: {}", e);
            Vec::new()
        })
    }

    /// Replace the cached listing
    pub fn set(&self, records: &[DocumentRecord]) {
        let result = serde_json::to_string(records)
            .map_err(store::StoreError::from)
            .and_then(|json| self.storage.write(&self.key, &json));
        if let Err(e) = result {
            tracing::warn!("Failed to write documents cache: {}", e);
        }
    }

    /// Drop the cached listing
    pub fn clear(&self) {
        if let Err(e) = self.storage.remove(&self.key) {
            tracing::warn!("Failed to clear documents cache: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op_id::DocumentId;
    use chrono::{TimeZone, Utc};
    use store::{MemoryStorage, DEFAULT_CACHE_KEY};

    fn record(id: u64, name: &str) -> DocumentRecord {
        DocumentRecord {
            id: DocumentId::new(id),
            name: name.to_string(),
            blob: format!("blob-{id}"),
            size: 1024,
            mime_category: "application/pdf".to_string(),
            description: "contract".to_string(),
            file_type: "PDF".to_string(),
            author: "carol".to_string(),
            uploaded_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
        }
    }

    fn new_cache() -> (Arc<MemoryStorage>, MetadataCache) {
        let storage = Arc::new(MemoryStorage::new());
        let cache = MetadataCache::new(storage.clone(), &AppSettings::default());
        (storage, cache)
    }

    #[test]
    fn test_empty_by_default() {
        let (_storage, cache) = new_cache();
        assert!(cache.get().is_empty());
    }

    #[test]
    fn test_set_then_get_preserves_order() {
        let (_storage, cache) = new_cache();
        let records = vec![record(2, "b.pdf"), record(1, "a.pdf")];
        cache.set(&records);
        assert_eq!(cache.get(), records);
    }

    #[test]
    fn test_set_overwrites() {
        let (_storage, cache) = new_cache();
        cache.set(&[record(1, "a.pdf"), record(2, "b.pdf")]);
        cache.set(&[record(3, "c.pdf")]);
        assert_eq!(cache.get(), vec![record(3, "c.pdf")]);
    }

    #[test]
    fn test_corrupt_value_reads_empty() {
        let (storage, cache) = new_cache();
        storage.write(DEFAULT_CACHE_KEY, "[{\"id\":").unwrap();
        assert!(cache.get().is_empty());
    }

    #[test]
    fn test_clear() {
        let (storage, cache) = new_cache();
        cache.set(&[record(1, "a.pdf")]);
        cache.clear();
        assert!(cache.get().is_empty());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_write_failure_keeps_previous_snapshot() {
        let storage = Arc::new(MemoryStorage::with_quota(400));
        let cache = MetadataCache::new(storage, &AppSettings::default());

        cache.set(&[record(1, "a.pdf")]);
        let many: Vec<_> = (0..20).map(|i| record(i, "x.pdf")).collect();
        cache.set(&many);

        assert_eq!(cache.get(), vec![record(1, "a.pdf")]);
    }
}
