//! Sync status summary for display.

use crate::op_id::OperationId;
use crate::operation::{OperationKind, OperationStatus, QueuedOperation};
use serde::{Deserialize, Serialize};

/// A failed operation as shown to the user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedOperationInfo {
    pub id: OperationId,
    pub kind: OperationKind,
    pub name: String,
    pub error: Option<String>,
}

/// Snapshot of connectivity and queue state for the document page
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatusInfo {
    pub online: bool,
    pub pending_count: usize,
    pub failed_count: usize,
    pub failed: Vec<FailedOperationInfo>,
    pub status_message: String,
}

impl SyncStatusInfo {
    /// Build a summary from the connectivity flag and the queued operations
    pub fn new(online: bool, operations: &[QueuedOperation]) -> Self {
        let pending_count = operations
            .iter()
            .filter(|op| op.status() == OperationStatus::Pending)
            .count();
        let failed: Vec<FailedOperationInfo> = operations
            .iter()
            .filter(|op| op.status() == OperationStatus::Failed)
            .map(|op| FailedOperationInfo {
                id: op.id().clone(),
                kind: op.kind(),
                name: op.display_name(),
                error: op.error().map(str::to_string),
            })
            .collect();

        let status_message = if !online {
            "Changes will sync when connection is restored"
        } else if pending_count > 0 {
            "Syncing queued operations..."
        } else {
            "All changes synced"
        }
        .to_string();

        Self {
            online,
            pending_count,
            failed_count: failed.len(),
            failed,
            status_message,
        }
    }

    /// Whether the status indicator should be visible
    ///
    /// Hidden only when online with nothing pending or failed.
    pub fn should_show(&self) -> bool {
        !self.online || self.pending_count > 0 || self.failed_count > 0
    }

    /// Get a short status string
    pub fn short_status(&self) -> &'static str {
        if self.online {
            "Online"
        } else {
            "Offline"
        }
    }

    /// Whether failed operations can be retried right now
    pub fn can_retry(&self) -> bool {
        self.online && self.failed_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op_id::DocumentId;
    use crate::queue::OfflineQueue;
    use std::sync::Arc;
    use store::{AppSettings, MemoryStorage};

    fn queue() -> OfflineQueue {
        OfflineQueue::load(Arc::new(MemoryStorage::new()), &AppSettings::default())
    }

    #[test]
    fn test_hidden_when_online_and_idle() {
        let info = SyncStatusInfo::new(true, &[]);
        assert!(!info.should_show());
        assert_eq!(info.status_message, "All changes synced");
        assert_eq!(info.short_status(), "Online");
    }

    #[test]
    fn test_offline_always_shown() {
        let info = SyncStatusInfo::new(false, &[]);
        assert!(info.should_show());
        assert_eq!(info.status_message, "Changes will sync when connection is restored");
        assert_eq!(info.short_status(), "Offline");
    }

    #[test]
    fn test_counts_and_failed_list() {
        let queue = queue();
        queue.enqueue_delete(DocumentId::new(1)).unwrap();
        let failed = queue.enqueue_delete(DocumentId::new(2)).unwrap();
        queue.update_status(&failed, OperationStatus::Failed, Some("denied".to_string()));

        let info = SyncStatusInfo::new(true, &queue.operations());
        assert_eq!(info.pending_count, 1);
        assert_eq!(info.failed_count, 1);
        assert_eq!(info.status_message, "Syncing queued operations...");
        assert!(info.can_retry());
        assert_eq!(
            info.failed,
            vec![FailedOperationInfo {
                id: failed,
                kind: OperationKind::Delete,
                name: "Document #2".to_string(),
                error: Some("denied".to_string()),
            }]
        );
    }

    #[test]
    fn test_cannot_retry_offline() {
        let queue = queue();
        let id = queue.enqueue_delete(DocumentId::new(2)).unwrap();
        queue.update_status(&id, OperationStatus::Failed, Some("denied".to_string()));

        let info = SyncStatusInfo::new(false, &queue.operations());
        assert!(!info.can_retry());
    }
}
