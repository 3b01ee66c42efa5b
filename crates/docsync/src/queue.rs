//! Offline operation queue.
//!
//! Document mutations made while offline are appended to an ordered queue that
//! is mirrored to durable storage after every change, so pending work survives
//! restarts. The sync coordinator drains it once connectivity returns.
//!
//! # Persistence
//!
//! - The full queue is written as a JSON array under one storage key.
//! - Every mutation runs load-mutate-persist under a single lock: the stored
//!   queue is re-read first, so writes made by another handle over the same
//!   storage (such as the `docsync` CLI) are not overwritten.
//! - An unreadable stored queue loads as empty and is logged. Entries that
//!   fail to parse are skipped one by one; the rest still load.
//! - Operations found `Syncing` at load time were abandoned mid-flight by a
//!   previous process and go back to `Pending` (configurable). Handles opened
//!   with [`OfflineQueue::attach`] never do this and write nothing until
//!   mutated.
//!
//! # Example
//!
//! ```
//! use docsync::{OfflineQueue, OperationStatus, DocumentId};
//! use store::{AppSettings, MemoryStorage};
//! use std::sync::Arc;
//!
//! let storage = Arc::new(MemoryStorage::new());
//! let queue = OfflineQueue::load(storage.clone(), &AppSettings::default());
//!
//! let id = queue.enqueue_delete(DocumentId::new(42)).unwrap();
//! assert_eq!(queue.pending_count(), 1);
//!
//! // A fresh queue over the same storage sees the same operation
//! let reloaded = OfflineQueue::load(storage, &AppSettings::default());
//! assert_eq!(reloaded.get(&id).unwrap().status(), OperationStatus::Pending);
//! ```

use crate::error::{QueueError, QueueResult};
use crate::op_id::{DocumentId, OperationId};
use crate::operation::{OperationPayload, OperationStatus, QueuedOperation, UploadPayload};
use crate::remote::NewDocument;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use store::{AppSettings, DurableStorage};
use tokio::sync::watch;

/// Persistent, ordered queue of document operations awaiting sync
pub struct OfflineQueue {
    storage: Arc<dyn DurableStorage>,
    /// Storage key holding the serialized queue
    key: String,
    /// Largest raw document body accepted by `enqueue_upload`
    max_upload_bytes: usize,
    operations: Mutex<Vec<QueuedOperation>>,
    /// Set while the in-memory queue holds changes storage rejected.
    /// Only touched with `operations` locked.
    unsaved: AtomicBool,
    /// Publishes the pending count after every mutation
    pending_tx: watch::Sender<usize>,
}

impl OfflineQueue {
    /// Load the queue from `storage`, falling back to an empty queue.
    ///
    /// This is the owning process's startup path: operations left `Syncing`
    /// are reset when `reset_syncing_on_load` is set.
    pub fn load(storage: Arc<dyn DurableStorage>, settings: &AppSettings) -> Self {
        Self::open(storage, settings, settings.offline.reset_syncing_on_load)
    }

    /// Open a queue owned by another process.
    ///
    /// Nothing is reconciled and nothing is written until a mutation is made.
    pub fn attach(storage: Arc<dyn DurableStorage>, settings: &AppSettings) -> Self {
        Self::open(storage, settings, false)
    }

    fn open(storage: Arc<dyn DurableStorage>, settings: &AppSettings, reconcile: bool) -> Self {
        let key = settings.storage.queue_key.clone();
        let mut operations = read_operations(storage.as_ref(), &key).unwrap_or_default();

        let mut reconciled = 0;
        if reconcile {
            for op in operations
                .iter_mut()
                .filter(|op| op.status() == OperationStatus::Syncing)
            {
                op.set_status(OperationStatus::Pending, None);
                reconciled += 1;
            }
        }

        let pending = count_status(&operations, OperationStatus::Pending);
        let (pending_tx, _rx) = watch::channel(pending);
        let queue = Self {
            storage,
            key,
            max_upload_bytes: settings.offline.max_upload_bytes,
            operations: Mutex::new(operations),
            unsaved: AtomicBool::new(false),
            pending_tx,
        };

        if reconciled > 0 {
            tracing::warn!(
                count = reconciled,
                "Reset operations interrupted mid-sync back to pending"
            );
            let ops = queue.lock();
            if let Err(e) = queue.save(&ops) {
                tracing::warn!("Failed to persist reconciled offline queue: {}", e);
            }
        }

        tracing::debug!(len = queue.len(), pending, "Loaded offline queue");
        queue
    }

    fn lock(&self) -> MutexGuard<'_, Vec<QueuedOperation>> {
        self.operations.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, ops: &[QueuedOperation]) -> QueueResult<()> {
        let json = serde_json::to_string(ops)?;
        self.storage.write(&self.key, &json)?;
        Ok(())
    }

    /// Persist, remembering whether storage is now behind memory
    fn save(&self, ops: &[QueuedOperation]) -> QueueResult<()> {
        let result = self.persist(ops);
        self.unsaved.store(result.is_err(), Ordering::Relaxed);
        result
    }

    /// Replace `ops` with the stored queue.
    ///
    /// Skipped while memory holds changes storage rejected, and when the
    /// stored value cannot be read at all.
    fn sync_from_storage(&self, ops: &mut Vec<QueuedOperation>) {
        if self.unsaved.load(Ordering::Relaxed) {
            return;
        }
        if let Some(stored) = read_operations(self.storage.as_ref(), &self.key) {
            *ops = stored;
        }
    }

    /// Pick up changes written to storage by another handle
    pub fn reload(&self) {
        let mut ops = self.lock();
        self.sync_from_storage(&mut ops);
        self.publish(&ops);
    }

    fn publish(&self, ops: &[QueuedOperation]) {
        let pending = count_status(ops, OperationStatus::Pending);
        self.pending_tx.send_if_modified(|current| {
            if *current == pending {
                false
            } else {
                *current = pending;
                true
            }
        });
    }

    /// Re-read storage, apply `f` to the queue, then persist and publish.
    ///
    /// Persist failures are logged; the in-memory change is kept.
    fn mutate<T>(&self, f: impl FnOnce(&mut Vec<QueuedOperation>) -> T) -> T {
        let mut ops = self.lock();
        self.sync_from_storage(&mut ops);
        let result = f(&mut ops);
        if let Err(e) = self.save(&ops) {
            tracing::warn!("Failed to persist offline queue: {}", e);
        }
        self.publish(&ops);
        result
    }

    fn enqueue(&self, payload: OperationPayload) -> QueueResult<OperationId> {
        let mut ops = self.lock();
        self.sync_from_storage(&mut ops);
        let mut op = QueuedOperation::new(payload);
        while ops.iter().any(|existing| existing.id() == op.id()) {
            op.regenerate_id();
        }
        let id = op.id().clone();
        let kind = op.kind();
        ops.push(op);

        // An operation that never reached storage would vanish on restart.
        if let Err(e) = self.persist(&ops) {
            ops.pop();
            return Err(e);
        }
        self.unsaved.store(false, Ordering::Relaxed);
        self.publish(&ops);

        tracing::info!(%id, %kind, "Queued document operation");
        Ok(id)
    }

    /// Queue an upload. The body is stored base64-encoded.
    ///
    /// Fails with [`QueueError::PayloadTooLarge`] when the body is larger than
    /// the configured `max_upload_bytes`.
    pub fn enqueue_upload(&self, document: &NewDocument) -> QueueResult<OperationId> {
        if document.content.len() > self.max_upload_bytes {
            return Err(QueueError::PayloadTooLarge {
                size: document.content.len(),
                limit: self.max_upload_bytes,
            });
        }
        self.enqueue(OperationPayload::Upload(UploadPayload::encode(document)))
    }

    /// Queue a delete of `document_id`
    pub fn enqueue_delete(&self, document_id: DocumentId) -> QueueResult<OperationId> {
        self.enqueue(OperationPayload::Delete { document_id })
    }

    /// Set the status of an operation. Unknown ids are ignored.
    ///
    /// `error` is recorded only for `Failed`.
    pub fn update_status(&self, id: &OperationId, status: OperationStatus, error: Option<String>) {
        self.mutate(|ops| {
            if let Some(op) = ops.iter_mut().find(|op| op.id() == id) {
                op.set_status(status, error);
            }
        });
    }

    /// Claim an operation for syncing.
    ///
    /// If the operation is `Pending` it becomes `Syncing` and a copy is
    /// returned; otherwise nothing changes and `None` is returned. The check
    /// and the transition happen under one lock, so concurrent passes never
    /// drive the same operation twice.
    pub fn begin_sync(&self, id: &OperationId) -> Option<QueuedOperation> {
        let mut ops = self.lock();
        self.sync_from_storage(&mut ops);
        let op = ops
            .iter_mut()
            .find(|op| op.id() == id && op.status() == OperationStatus::Pending)?;
        op.set_status(OperationStatus::Syncing, None);
        let claimed = op.clone();

        if let Err(e) = self.save(&ops) {
            tracing::warn!("Failed to persist offline queue: {}", e);
        }
        self.publish(&ops);
        Some(claimed)
    }

    /// Put an operation back to `Pending` and clear its error, whatever its status
    pub fn retry(&self, id: &OperationId) -> bool {
        let found = self.mutate(|ops| match ops.iter_mut().find(|op| op.id() == id) {
            Some(op) => {
                op.set_status(OperationStatus::Pending, None);
                true
            }
            None => false,
        });
        if found {
            tracing::info!(%id, "Operation queued for retry");
        }
        found
    }

    /// Remove an operation. Returns false if it was not queued.
    pub fn remove(&self, id: &OperationId) -> bool {
        self.mutate(|ops| {
            let before = ops.len();
            ops.retain(|op| op.id() != id);
            ops.len() != before
        })
    }

    /// Remove every `Succeeded` operation, keeping the order of the rest.
    /// Returns the number removed.
    pub fn clear_succeeded(&self) -> usize {
        self.mutate(|ops| {
            let before = ops.len();
            ops.retain(|op| op.status() != OperationStatus::Succeeded);
            before - ops.len()
        })
    }

    /// All operations in enqueue order
    pub fn operations(&self) -> Vec<QueuedOperation> {
        self.lock().clone()
    }

    /// Look up one operation
    pub fn get(&self, id: &OperationId) -> Option<QueuedOperation> {
        self.lock().iter().find(|op| op.id() == id).cloned()
    }

    /// Number of queued operations
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Number of operations waiting for a sync pass
    pub fn pending_count(&self) -> usize {
        count_status(&self.lock(), OperationStatus::Pending)
    }

    /// Number of operations waiting for a manual retry
    pub fn failed_count(&self) -> usize {
        count_status(&self.lock(), OperationStatus::Failed)
    }

    /// Whether any operation has failed
    pub fn has_failed(&self) -> bool {
        self.failed_count() > 0
    }

    /// Number of operations awaiting cleanup
    pub fn succeeded_count(&self) -> usize {
        count_status(&self.lock(), OperationStatus::Succeeded)
    }

    /// Subscribe to changes of the pending count
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.pending_tx.subscribe()
    }
}

fn count_status(ops: &[QueuedOperation], status: OperationStatus) -> usize {
    ops.iter().filter(|op| op.status() == status).count()
}

/// Read the stored queue.
///
/// `None` when storage cannot be read or the value is not a JSON array.
/// Entries that do not parse are logged and skipped.
fn read_operations(storage: &dyn DurableStorage, key: &str) -> Option<Vec<QueuedOperation>> {
    let stored = match storage.read(key) {
        Ok(Some(stored)) => stored,
        Ok(None) => return Some(Vec::new()),
        Err(e) => {
            tracing::warn!("Failed to read offline queue: {}", e);
            return None;
        }
    };

    let entries = match serde_json::from_str::<Vec<serde_json::Value>>(&stored) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!("Failed to parse offline queue: {}", e);
            return None;
        }
    };

    let operations = entries
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| match serde_json::from_value(entry) {
            Ok(op) => Some(op),
            Err(e) => {
                tracing::warn!(index, "Skipping unreadable queued operation: {}", e);
                None
            }
        })
        .collect();
    Some(operations)
}
