//! Document page controller.
//!
//! Routes user-initiated uploads and deletes either straight to the remote
//! service (online) or into the offline queue (offline), and keeps the
//! displayed document list in step with the remote listing and its cache.
//!
//! Online failures are reported and returned to the caller. They are not
//! queued: the user decides whether to try again.

use crate::cache::MetadataCache;
use crate::connectivity::ConnectivityMonitor;
use crate::error::ControllerResult;
use crate::notify::{Notification, Notifier};
use crate::op_id::{DocumentId, OperationId};
use crate::queue::OfflineQueue;
use crate::remote::{DocumentRecord, NewDocument, RemoteDocumentService, RemoteError};
use crate::status::SyncStatusInfo;
use crate::sync::{SyncCoordinator, SyncReport};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// Result of a user upload
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Stored remotely under this id
    Uploaded(DocumentId),
    /// Queued for the next sync pass
    Queued(OperationId),
}

/// Result of a user delete
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    Queued(OperationId),
}

/// Composes queue, cache, connectivity, and remote service for the document page
pub struct DocumentPageController<R, N> {
    queue: Arc<OfflineQueue>,
    cache: MetadataCache,
    remote: Arc<R>,
    notifier: Arc<N>,
    connectivity: ConnectivityMonitor,
    /// List currently shown; seeded from the cache
    displayed: RwLock<Vec<DocumentRecord>>,
}

impl<R, N> DocumentPageController<R, N>
where
    R: RemoteDocumentService,
    N: Notifier,
{
    /// Create a controller, showing the cached listing until the first fetch
    pub fn new(
        queue: Arc<OfflineQueue>,
        cache: MetadataCache,
        remote: Arc<R>,
        notifier: Arc<N>,
        connectivity: ConnectivityMonitor,
    ) -> Self {
        let displayed = RwLock::new(cache.get());
        Self {
            queue,
            cache,
            remote,
            notifier,
            connectivity,
            displayed,
        }
    }

    /// Documents to display
    pub fn documents(&self) -> Vec<DocumentRecord> {
        self.displayed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The queue backing this page
    pub fn queue(&self) -> &Arc<OfflineQueue> {
        &self.queue
    }

    /// Fetch the live listing.
    ///
    /// On success the displayed list and the cache are replaced. On failure
    /// both are left as they were.
    pub async fn refresh(&self) -> Result<Vec<DocumentRecord>, RemoteError> {
        let documents = self.remote.list_documents().await.inspect_err(|e| {
            tracing::warn!("Failed to load documents: {}", e);
        })?;

        self.cache.set(&documents);
        *self.displayed.write().unwrap_or_else(PoisonError::into_inner) = documents.clone();
        Ok(documents)
    }

    async fn refresh_after_change(&self) {
        // The mutation itself succeeded; a stale list is not an error for the caller.
        let _ = self.refresh().await;
    }

    /// Upload a document now, or queue it if offline
    pub async fn upload(&self, document: NewDocument) -> ControllerResult<UploadOutcome> {
        if !self.connectivity.is_online() {
            return match self.queue.enqueue_upload(&document) {
                Ok(id) => {
                    self.notifier
                        .notify(Notification::info("Document queued for upload when online"));
                    Ok(UploadOutcome::Queued(id))
                }
                Err(e) => {
                    self.notifier
                        .notify(Notification::error(format!("Could not queue upload: {e}")));
                    Err(e.into())
                }
            };
        }

        match self.remote.add_document(document).await {
            Ok(id) => {
                self.notifier
                    .notify(Notification::success("Document uploaded successfully"));
                self.refresh_after_change().await;
                Ok(UploadOutcome::Uploaded(id))
            }
            Err(e) => {
                self.notifier
                    .notify(Notification::error(format!("Upload failed: {e}")));
                Err(e.into())
            }
        }
    }

    /// Delete a document now, or queue the delete if offline
    pub async fn delete(&self, id: DocumentId) -> ControllerResult<DeleteOutcome> {
        if !self.connectivity.is_online() {
            return match self.queue.enqueue_delete(id) {
                Ok(op_id) => {
                    self.notifier
                        .notify(Notification::info("Delete queued for when online"));
                    Ok(DeleteOutcome::Queued(op_id))
                }
                Err(e) => {
                    self.notifier
                        .notify(Notification::error(format!("Could not queue delete: {e}")));
                    Err(e.into())
                }
            };
        }

        match self.remote.delete_document(id).await {
            Ok(()) => {
                self.notifier
                    .notify(Notification::success("Document deleted successfully"));
                self.refresh_after_change().await;
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => {
                self.notifier
                    .notify(Notification::error(format!("Delete failed: {e}")));
                Err(e.into())
            }
        }
    }

    /// Put a failed operation back in line for the next pass
    pub fn retry(&self, id: &OperationId) -> bool {
        self.queue.retry(id)
    }

    /// Drop a queued operation without running it
    pub fn remove_operation(&self, id: &OperationId) -> bool {
        self.queue.remove(id)
    }

    /// Connectivity and queue summary for display
    pub fn status(&self) -> SyncStatusInfo {
        SyncStatusInfo::new(self.connectivity.is_online(), &self.queue.operations())
    }
}

impl<R, N> DocumentPageController<R, N>
where
    R: RemoteDocumentService + 'static,
    N: Notifier + 'static,
{
    /// Run a sync pass, refreshing the listing if anything was applied
    pub async fn sync_now(&self, coordinator: &SyncCoordinator<R, N>) -> SyncReport {
        let report = coordinator.run_pass().await;
        if report.succeeded > 0 {
            self.refresh_after_change().await;
        }
        report
    }

    /// Refresh the listing after every background pass that applied something.
    ///
    /// `reports` comes from [`SyncCoordinator::subscribe_reports`]. The task
    /// ends when the coordinator is dropped.
    pub fn follow(
        self: Arc<Self>,
        mut reports: broadcast::Receiver<SyncReport>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match reports.recv().await {
                    Ok(report) if report.succeeded > 0 => self.refresh_after_change().await,
                    Ok(_) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "Missed sync reports, refreshing");
                        self.refresh_after_change().await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }
}
