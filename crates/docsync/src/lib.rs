//! Offline-resilient document synchronization.
//!
//! Lets a document page keep working without network access. Uploads and
//! deletes made while offline are recorded in a durable queue and replayed
//! against the remote document service once connectivity returns; the last
//! successful document listing is cached for display while the service is
//! unreachable.
//!
//! # Modules
//!
//! - `op_id`: Operation and document identifiers
//! - `operation`: Queued operation records and their payloads
//! - `queue`: Durable, ordered queue of pending operations
//! - `cache`: Last-known-good document listing
//! - `connectivity`: Observable online/offline flag
//! - `remote`: Remote document service interface and an in-memory implementation
//! - `sync`: Coordinator that drains the queue when online
//! - `notify`: User-visible notifications
//! - `status`: Queue and connectivity summary for display
//! - `controller`: Document page controller tying the pieces together
//! - `error`: Error types for the crate
//!
//! # Example
//!
//! ```
//! use docsync::{
//!     ConnectivityMonitor, LogNotifier, MemoryDocumentService, NewDocument, OfflineQueue,
//!     SyncCoordinator,
//! };
//! use store::{AppSettings, MemoryStorage};
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let settings = AppSettings::default();
//! let queue = Arc::new(OfflineQueue::load(Arc::new(MemoryStorage::new()), &settings));
//! let connectivity = ConnectivityMonitor::new(false);
//! let remote = Arc::new(MemoryDocumentService::new());
//!
//! queue
//!     .enqueue_upload(&NewDocument {
//!         name: "notes.txt".to_string(),
//!         content: b"hello".to_vec(),
//!         description: "Meeting notes".to_string(),
//!         mime_category: "text/plain".to_string(),
//!         author: "alice".to_string(),
//!         size: 5,
//!         file_type: "Text".to_string(),
//!     })
//!     .unwrap();
//!
//! let coordinator = SyncCoordinator::new(
//!     queue.clone(),
//!     remote.clone(),
//!     Arc::new(LogNotifier),
//!     connectivity.clone(),
//!     &settings.offline,
//! );
//!
//! connectivity.set_online(true);
//! let report = coordinator.run_pass().await;
//! assert_eq!(report.succeeded, 1);
//! assert_eq!(remote.documents().len(), 1);
//! # }
//! ```

pub mod cache;
pub mod connectivity;
pub mod controller;
pub mod error;
pub mod notify;
pub mod op_id;
pub mod operation;
pub mod queue;
pub mod remote;
pub mod status;
pub mod sync;

// Re-export commonly used types
pub use cache::MetadataCache;
pub use connectivity::ConnectivityMonitor;
pub use controller::{DeleteOutcome, DocumentPageController, UploadOutcome};
pub use error::{ControllerError, ControllerResult, QueueError, QueueResult, SyncError};
pub use notify::{LogNotifier, Notification, NotificationLevel, Notifier};
pub use op_id::{DocumentId, OperationId};
pub use operation::{
    OperationKind, OperationPayload, OperationStatus, QueuedOperation, UploadPayload,
};
pub use queue::OfflineQueue;
pub use remote::{
    DocumentRecord, MemoryDocumentService, NewDocument, RemoteDocumentService, RemoteError,
};
pub use status::{FailedOperationInfo, SyncStatusInfo};
pub use sync::{SyncCoordinator, SyncReport};
