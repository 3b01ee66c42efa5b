//! Sync coordinator for queued document operations.
//!
//! This module drains the offline queue against the remote service. It handles:
//!
//! - Walking the queue in enqueue order, once per pass
//! - Claiming each pending operation before calling the remote service
//! - Recording success or failure per operation, with a notification
//! - Dropping succeeded operations after a short delay
//! - Re-running whenever connectivity returns or the pending count changes
//! - Publishing a [`SyncReport`] after every pass that did something
//!
//! Failures never abort a pass. A failed operation stays in the queue until
//! the user retries or removes it; the coordinator does not retry on its own.

use crate::connectivity::ConnectivityMonitor;
use crate::error::SyncError;
use crate::notify::{Notification, Notifier};
use crate::op_id::OperationId;
use crate::operation::{OperationPayload, OperationStatus, QueuedOperation};
use crate::queue::OfflineQueue;
use crate::remote::RemoteDocumentService;
use std::sync::Arc;
use std::time::Duration;
use store::OfflineSettings;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Outcome of one sync pass
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Operations claimed and sent to the remote service
    pub attempted: usize,
    /// Operations that completed
    pub succeeded: usize,
    /// Operations that failed, with their error text
    pub failed: Vec<(OperationId, String)>,
}

impl SyncReport {
    /// Whether the pass did nothing
    pub fn is_empty(&self) -> bool {
        self.attempted == 0
    }
}

/// Drains the offline queue whenever connectivity is available
pub struct SyncCoordinator<R, N> {
    queue: Arc<OfflineQueue>,
    remote: Arc<R>,
    notifier: Arc<N>,
    connectivity: ConnectivityMonitor,
    /// Delay between the end of a pass and removal of succeeded operations
    cleanup_delay: Duration,
    reports: broadcast::Sender<SyncReport>,
}

impl<R, N> SyncCoordinator<R, N>
where
    R: RemoteDocumentService + 'static,
    N: Notifier + 'static,
{
    /// Create a new sync coordinator
    pub fn new(
        queue: Arc<OfflineQueue>,
        remote: Arc<R>,
        notifier: Arc<N>,
        connectivity: ConnectivityMonitor,
        settings: &OfflineSettings,
    ) -> Self {
        Self {
            queue,
            remote,
            notifier,
            connectivity,
            cleanup_delay: Duration::from_millis(settings.cleanup_delay_ms),
            reports: broadcast::channel(16).0,
        }
    }

    /// The queue being drained
    pub fn queue(&self) -> &Arc<OfflineQueue> {
        &self.queue
    }

    /// Subscribe to reports of passes that attempted at least one operation
    pub fn subscribe_reports(&self) -> broadcast::Receiver<SyncReport> {
        self.reports.subscribe()
    }

    /// Run one pass over the queue.
    ///
    /// Does nothing while offline. Each `Pending` operation is claimed
    /// (`Syncing`), executed, and marked `Succeeded` or `Failed`. If any
    /// operation is `Succeeded` afterwards, a cleanup is scheduled after the
    /// configured delay.
    pub async fn run_pass(&self) -> SyncReport {
        let mut report = SyncReport::default();
        if !self.connectivity.is_online() {
            tracing::debug!("Skipping sync pass while offline");
            return report;
        }

        self.queue.reload();
        let pending: Vec<OperationId> = self
            .queue
            .operations()
            .into_iter()
            .filter(|op| op.status() == OperationStatus::Pending)
            .map(|op| op.id().clone())
            .collect();

        for id in pending {
            // Another pass may have claimed it since the snapshot
            let Some(op) = self.queue.begin_sync(&id) else {
                continue;
            };
            report.attempted += 1;

            match self.execute(&op).await {
                Ok(message) => {
                    self.queue.update_status(&id, OperationStatus::Succeeded, None);
                    self.notifier.notify(Notification::success(message));
                    report.succeeded += 1;
                }
                Err(e) => {
                    let message = e.to_string();
                    tracing::warn!(%id, error = %message, "Queued operation failed");
                    self.queue
                        .update_status(&id, OperationStatus::Failed, Some(message.clone()));
                    self.notifier
                        .notify(Notification::error(format!("Failed to sync: {message}")));
                    report.failed.push((id, message));
                }
            }
        }

        if self.queue.succeeded_count() > 0 {
            self.schedule_cleanup();
        }

        if !report.is_empty() {
            tracing::info!(
                attempted = report.attempted,
                succeeded = report.succeeded,
                failed = report.failed.len(),
                "Sync pass complete"
            );
            // No subscribers is fine
            let _ = self.reports.send(report.clone());
        }
        report
    }

    async fn execute(&self, op: &QueuedOperation) -> Result<&'static str, SyncError> {
        match op.payload() {
            OperationPayload::Upload(upload) => {
                let document = upload.decode()?;
                let document_id = self.remote.add_document(document).await?;
                tracing::debug!(id = %op.id(), %document_id, "Uploaded queued document");
                Ok("Document uploaded successfully")
            }
            OperationPayload::Delete { document_id } => {
                self.remote.delete_document(*document_id).await?;
                tracing::debug!(id = %op.id(), %document_id, "Deleted queued document");
                Ok("Document deleted successfully")
            }
        }
    }

    fn schedule_cleanup(&self) {
        let queue = Arc::clone(&self.queue);
        let delay = self.cleanup_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let removed = queue.clear_succeeded();
            if removed > 0 {
                tracing::debug!(removed, "Cleared succeeded operations");
            }
        });
    }

    /// React to connectivity and queue changes until the task is aborted.
    ///
    /// A pass runs whenever the device is online and the queue holds pending
    /// or succeeded-but-not-yet-cleared operations.
    pub async fn run(&self) {
        let mut online = self.connectivity.subscribe();
        let mut pending = self.queue.subscribe();

        loop {
            let is_online = *online.borrow_and_update();
            let _ = pending.borrow_and_update();

            if is_online && (self.queue.pending_count() > 0 || self.queue.succeeded_count() > 0) {
                self.run_pass().await;
            }

            tokio::select! {
                changed = online.changed() => if changed.is_err() { break },
                changed = pending.changed() => if changed.is_err() { break },
            }
        }
    }

    /// Start [`run`](Self::run) on a background task
    pub fn spawn(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run().await })
    }
}
