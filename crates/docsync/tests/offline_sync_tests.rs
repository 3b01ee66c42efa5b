//! Integration tests for offline document sync
//! Tests queueing while offline, replay on reconnect, and restart recovery
//!
//! These tests wire the queue, cache, coordinator, and page controller over
//! real storage backends and drive them through connectivity changes the way
//! a running application would.

use docsync::{
    ConnectivityMonitor, DeleteOutcome, DocumentId, DocumentPageController, DocumentRecord,
    MemoryDocumentService, MetadataCache, NewDocument, Notification, NotificationLevel,
    OfflineQueue, OperationKind, OperationStatus, RemoteError, SyncCoordinator, UploadOutcome,
};
use std::sync::Arc;
use std::time::Duration;
use store::{AppSettings, DurableStorage, FileStorage, MemoryStorage};
use tempfile::TempDir;
use tokio::sync::mpsc;

type Sender = mpsc::UnboundedSender<Notification>;

/// Test harness for one simulated application instance
struct App {
    remote: Arc<MemoryDocumentService>,
    connectivity: ConnectivityMonitor,
    controller: Arc<DocumentPageController<MemoryDocumentService, Sender>>,
    coordinator: Arc<SyncCoordinator<MemoryDocumentService, Sender>>,
    notifications: mpsc::UnboundedReceiver<Notification>,
}

impl App {
    fn start(
        storage: Arc<dyn DurableStorage>,
        remote: Arc<MemoryDocumentService>,
        online: bool,
    ) -> Self {
        let settings = AppSettings::default();
        let queue = Arc::new(OfflineQueue::load(storage.clone(), &settings));
        let cache = MetadataCache::new(storage, &settings);
        let connectivity = ConnectivityMonitor::new(online);
        let (tx, notifications) = mpsc::unbounded_channel();
        let notifier = Arc::new(tx);

        let controller = Arc::new(DocumentPageController::new(
            queue.clone(),
            cache,
            remote.clone(),
            notifier.clone(),
            connectivity.clone(),
        ));
        let coordinator = Arc::new(SyncCoordinator::new(
            queue,
            remote.clone(),
            notifier,
            connectivity.clone(),
            &settings.offline,
        ));

        Self {
            remote,
            connectivity,
            controller,
            coordinator,
            notifications,
        }
    }

    fn queue(&self) -> &Arc<OfflineQueue> {
        self.controller.queue()
    }

    fn drain_notifications(&mut self) -> Vec<Notification> {
        let mut out = Vec::new();
        while let Ok(n) = self.notifications.try_recv() {
            out.push(n);
        }
        out
    }
}

fn invoice() -> NewDocument {
    NewDocument {
        name: "invoice.pdf".to_string(),
        content: vec![0x25; 2048],
        description: "March invoice".to_string(),
        mime_category: "application/pdf".to_string(),
        author: "alice".to_string(),
        size: 2048,
        file_type: "PDF".to_string(),
    }
}

fn listed(id: u64, name: &str) -> DocumentRecord {
    DocumentRecord {
        id: DocumentId::new(id),
        name: name.to_string(),
        blob: format!("mem://documents/{id}"),
        size: 100,
        mime_category: "application/pdf".to_string(),
        description: String::new(),
        file_type: "PDF".to_string(),
        author: "bob".to_string(),
        uploaded_at: chrono::Utc::now(),
    }
}

// ================== Offline Queueing ==================

#[tokio::test(start_paused = true)]
async fn test_offline_upload_synced_on_reconnect() {
    let remote = Arc::new(MemoryDocumentService::new());
    let mut app = App::start(Arc::new(MemoryStorage::new()), remote, false);
    let follower = app
        .controller
        .clone()
        .follow(app.coordinator.subscribe_reports());
    let handle = app.coordinator.clone().spawn();

    let UploadOutcome::Queued(id) = app.controller.upload(invoice()).await.unwrap() else {
        panic!("upload while offline should be queued");
    };
    assert_eq!(app.queue().len(), 1);
    assert_eq!(app.queue().get(&id).unwrap().kind(), OperationKind::Upload);
    assert!(app.controller.status().should_show());

    app.connectivity.set_online(true);
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(app.queue().get(&id).unwrap().status(), OperationStatus::Succeeded);
    // Exactly one call, carrying the original fields unchanged
    assert_eq!(app.remote.add_calls(), vec![invoice()]);
    // The page shows the synced document without an explicit refresh
    let names: Vec<_> = app
        .controller
        .documents()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, vec!["invoice.pdf"]);

    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert!(app.queue().is_empty());
    assert!(!app.controller.status().should_show());

    let levels: Vec<_> = app
        .drain_notifications()
        .into_iter()
        .map(|n| n.level)
        .collect();
    assert_eq!(levels, vec![NotificationLevel::Info, NotificationLevel::Success]);

    handle.abort();
    follower.abort();
}

#[tokio::test]
async fn test_offline_delete_rejected_on_reconnect() {
    let remote = Arc::new(MemoryDocumentService::new());
    remote.fail_next_delete(RemoteError::Rejected("not found".to_string()));
    let app = App::start(Arc::new(MemoryStorage::new()), remote, false);

    let DeleteOutcome::Queued(id) = app.controller.delete(DocumentId::new(42)).await.unwrap()
    else {
        panic!("delete while offline should be queued");
    };

    app.connectivity.set_online(true);
    let report = app.controller.sync_now(&app.coordinator).await;
    assert_eq!(report.failed.len(), 1);

    let op = app.queue().get(&id).unwrap();
    assert_eq!(op.status(), OperationStatus::Failed);
    assert_eq!(op.error(), Some("not found"));

    let status = app.controller.status();
    assert_eq!(status.failed_count, 1);
    assert_eq!(status.failed[0].name, "Document #42");
    assert!(status.can_retry());

    // A second pass leaves it alone until the user retries
    app.controller.sync_now(&app.coordinator).await;
    assert_eq!(app.remote.delete_calls().len(), 1);

    assert!(app.controller.retry(&id));
    app.controller.sync_now(&app.coordinator).await;
    assert_eq!(app.queue().get(&id).unwrap().status(), OperationStatus::Succeeded);
}

#[tokio::test]
async fn test_mixed_queue_preserves_order() {
    let remote = Arc::new(MemoryDocumentService::with_documents(vec![listed(7, "old.pdf")]));
    let app = App::start(Arc::new(MemoryStorage::new()), remote, false);

    app.controller.upload(invoice()).await.unwrap();
    app.controller.delete(DocumentId::new(7)).await.unwrap();
    let kinds: Vec<_> = app.queue().operations().iter().map(|op| op.kind()).collect();
    assert_eq!(kinds, vec![OperationKind::Upload, OperationKind::Delete]);

    app.connectivity.set_online(true);
    let report = app.controller.sync_now(&app.coordinator).await;
    assert_eq!(report.succeeded, 2);

    let names: Vec<_> = app
        .controller
        .documents()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, vec!["invoice.pdf"]);
}

// ================== Restart Recovery ==================

#[tokio::test]
async fn test_queue_survives_restart() {
    let dir = TempDir::new().unwrap();
    let remote = Arc::new(MemoryDocumentService::new());

    let queued = {
        let storage = Arc::new(FileStorage::new(dir.path()).unwrap());
        let app = App::start(storage, remote.clone(), false);
        app.controller.upload(invoice()).await.unwrap();
        app.controller.delete(DocumentId::new(3)).await.unwrap();
        app.queue().operations()
    };

    let storage = Arc::new(FileStorage::new(dir.path()).unwrap());
    let app = App::start(storage, remote, true);
    assert_eq!(app.queue().operations(), queued);

    let report = app.coordinator.run_pass().await;
    assert_eq!(report.succeeded, 2);
    assert_eq!(app.remote.add_calls(), vec![invoice()]);
}

#[tokio::test]
async fn test_operation_interrupted_mid_sync_is_resumed() {
    let storage = Arc::new(MemoryStorage::new());
    let remote = Arc::new(MemoryDocumentService::new());

    let id = {
        let app = App::start(storage.clone(), remote.clone(), true);
        let id = app.queue().enqueue_delete(DocumentId::new(5)).unwrap();
        app.queue().begin_sync(&id).unwrap();
        id
    };

    let app = App::start(storage, remote, true);
    assert_eq!(app.queue().get(&id).unwrap().status(), OperationStatus::Pending);

    app.coordinator.run_pass().await;
    assert_eq!(app.remote.delete_calls(), vec![DocumentId::new(5)]);
}

// ================== Metadata Cache ==================

#[tokio::test]
async fn test_cached_listing_shown_while_remote_unavailable() {
    let storage = Arc::new(MemoryStorage::new());
    let remote = Arc::new(MemoryDocumentService::with_documents(vec![
        listed(1, "a.pdf"),
        listed(2, "b.pdf"),
    ]));

    {
        let app = App::start(storage.clone(), remote.clone(), true);
        app.controller.refresh().await.unwrap();
    }

    remote.set_unavailable(true);
    let app = App::start(storage, remote, true);
    assert!(app.controller.refresh().await.is_err());

    let names: Vec<_> = app
        .controller
        .documents()
        .into_iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(names, vec!["a.pdf", "b.pdf"]);
}
