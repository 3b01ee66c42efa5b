//! Remote data service interface.
//!
//! The remote service is the system of record for documents. This crate only
//! needs three calls from it: add, delete, and list. Any call may reject; the
//! sync layer treats every rejection as a retryable failure.

use crate::op_id::DocumentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// A document as listed by the remote service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub name: String,
    /// Opaque handle to the stored document body
    pub blob: String,
    pub size: u64,
    /// MIME category, e.g. `application/pdf`
    pub mime_category: String,
    pub description: String,
    /// Human-readable file-type label, e.g. `PDF`
    pub file_type: String,
    pub author: String,
    pub uploaded_at: DateTime<Utc>,
}

/// Arguments of an add-document call
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewDocument {
    pub name: String,
    pub content: Vec<u8>,
    pub description: String,
    pub mime_category: String,
    pub author: String,
    pub size: u64,
    pub file_type: String,
}

/// Rejection returned by the remote service
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The service answered and refused the call
    #[error("{0}")]
    Rejected(String),

    /// The service could not be reached
    #[error("Network unavailable: {0}")]
    Unavailable(String),
}

/// Remote document operations.
#[trait_variant::make(Send)]
pub trait RemoteDocumentService: Send + Sync {
    /// Store a new document and return its identifier.
    async fn add_document(&self, document: NewDocument) -> Result<DocumentId, RemoteError>;

    /// Delete a document.
    async fn delete_document(&self, id: DocumentId) -> Result<(), RemoteError>;

    /// List all documents in the service's order.
    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, RemoteError>;
}

#[derive(Default)]
struct MemoryServiceState {
    documents: Vec<DocumentRecord>,
    next_id: u64,
    unavailable: bool,
    add_failures: VecDeque<RemoteError>,
    delete_failures: VecDeque<RemoteError>,
    list_failure: Option<RemoteError>,
    add_calls: Vec<NewDocument>,
    delete_calls: Vec<DocumentId>,
    list_calls: usize,
}

/// In-memory implementation of [`RemoteDocumentService`]
///
/// Intended for development and tests. Records every call and can be told to
/// reject upcoming calls. Deleting an unknown id succeeds, matching a service
/// whose deletes are idempotent.
#[derive(Default)]
pub struct MemoryDocumentService {
    state: Mutex<MemoryServiceState>,
}

impl MemoryDocumentService {
    /// Create an empty service
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a service already holding `documents`
    pub fn with_documents(documents: Vec<DocumentRecord>) -> Self {
        let next_id = documents.iter().map(|d| d.id.value()).max().unwrap_or(0);
        Self {
            state: Mutex::new(MemoryServiceState {
                documents,
                next_id,
                ..Default::default()
            }),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, MemoryServiceState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every call fail with [`RemoteError::Unavailable`] until reset
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// Reject the next add call with `error`
    pub fn fail_next_add(&self, error: RemoteError) {
        self.state().add_failures.push_back(error);
    }

    /// Reject the next delete call with `error`
    pub fn fail_next_delete(&self, error: RemoteError) {
        self.state().delete_failures.push_back(error);
    }

    /// Reject every list call with `error`, or stop doing so with `None`
    pub fn set_list_failure(&self, error: Option<RemoteError>) {
        self.state().list_failure = error;
    }

    /// Every add call received, in order
    pub fn add_calls(&self) -> Vec<NewDocument> {
        self.state().add_calls.clone()
    }

    /// Every delete call received, in order
    pub fn delete_calls(&self) -> Vec<DocumentId> {
        self.state().delete_calls.clone()
    }

    /// Number of list calls received
    pub fn list_calls(&self) -> usize {
        self.state().list_calls
    }

    /// Documents currently held
    pub fn documents(&self) -> Vec<DocumentRecord> {
        self.state().documents.clone()
    }
}

impl RemoteDocumentService for MemoryDocumentService {
    async fn add_document(&self, document: NewDocument) -> Result<DocumentId, RemoteError> {
        let mut state = self.state();
        state.add_calls.push(document.clone());
        if state.unavailable {
            return Err(RemoteError::Unavailable("service offline".to_string()));
        }
        if let Some(err) = state.add_failures.pop_front() {
            return Err(err);
        }

        state.next_id += 1;
        let id = DocumentId::new(state.next_id);
        state.documents.push(DocumentRecord {
            id,
            blob: format!("mem://documents/{id}"),
            name: document.name,
            size: document.size,
            mime_category: document.mime_category,
            description: document.description,
            file_type: document.file_type,
            author: document.author,
            uploaded_at: Utc::now(),
        });
        Ok(id)
    }

    async fn delete_document(&self, id: DocumentId) -> Result<(), RemoteError> {
        let mut state = self.state();
        state.delete_calls.push(id);
        if state.unavailable {
            return Err(RemoteError::Unavailable("service offline".to_string()));
        }
        if let Some(err) = state.delete_failures.pop_front() {
            return Err(err);
        }
        state.documents.retain(|d| d.id != id);
        Ok(())
    }

    async fn list_documents(&self) -> Result<Vec<DocumentRecord>, RemoteError> {
        let mut state = self.state();
        state.list_calls += 1;
        if state.unavailable {
            return Err(RemoteError::Unavailable("service offline".to_string()));
        }
        if let Some(err) = &state.list_failure {
            return Err(err.clone());
        }
        Ok(state.documents.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_doc(name: &str) -> NewDocument {
        NewDocument {
            name: name.to_string(),
            content: b"%PDF-1.4".to_vec(),
            description: "Quarterly invoice".to_string(),
            mime_category: "application/pdf".to_string(),
            author: "alice".to_string(),
            size: 8,
            file_type: "PDF".to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_then_list() {
        let service = MemoryDocumentService::new();
        let id = service.add_document(new_doc("a.pdf")).await.unwrap();

        let docs = service.list_documents().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, id);
        assert_eq!(docs[0].name, "a.pdf");
        assert_eq!(service.add_calls().len(), 1);
        assert_eq!(service.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_ids_continue_after_seeded_documents() {
        let service = MemoryDocumentService::new();
        service.add_document(new_doc("a.pdf")).await.unwrap();
        let seeded = MemoryDocumentService::with_documents(service.documents());

        let id = seeded.add_document(new_doc("b.pdf")).await.unwrap();
        assert_eq!(id, DocumentId::new(2));
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let service = MemoryDocumentService::new();
        service.fail_next_add(RemoteError::Rejected("quota".to_string()));

        let first = service.add_document(new_doc("a.pdf")).await;
        assert_eq!(first, Err(RemoteError::Rejected("quota".to_string())));
        assert!(service.add_document(new_doc("a.pdf")).await.is_ok());
        assert_eq!(service.add_calls().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_unknown_is_ok() {
        let service = MemoryDocumentService::new();
        assert!(service.delete_document(DocumentId::new(7)).await.is_ok());
        assert_eq!(service.delete_calls(), vec![DocumentId::new(7)]);
    }

    #[tokio::test]
    async fn test_unavailable() {
        let service = MemoryDocumentService::new();
        service.set_unavailable(true);

        assert!(matches!(
            service.list_documents().await,
            Err(RemoteError::Unavailable(_))
        ));
        service.set_unavailable(false);
        assert!(service.list_documents().await.is_ok());
    }

    #[test]
    fn test_rejection_message_is_verbatim() {
        assert_eq!(
            RemoteError::Rejected("not found".to_string()).to_string(),
            "not found"
        );
    }
}
