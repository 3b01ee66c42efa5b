//! Queued document operations.
//!
//! A [`QueuedOperation`] is a document mutation (upload or delete) recorded
//! while it could not be sent to the remote service. Its payload is fixed at
//! enqueue time; only the status and error change afterwards.
//!
//! # Status lifecycle
//!
//! ```text
//! Pending ──> Syncing ──> Succeeded ──> (removed after cleanup delay)
//!    ^           │
//!    │           └──────> Failed
//!    └─────── retry ────────┘
//! ```

use crate::error::SyncError;
use crate::op_id::{DocumentId, OperationId};
use crate::remote::NewDocument;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a queued operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Upload,
    Delete,
}

impl OperationKind {
    /// Lowercase name, used as the operation id prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Upload => "upload",
            OperationKind::Delete => "delete",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sync status of a queued operation
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    /// Waiting for the next sync pass
    #[default]
    Pending,
    /// Handed to the remote service, outcome unknown
    Syncing,
    /// Last attempt failed; waits for a manual retry
    Failed,
    /// Applied remotely; removed after the cleanup delay
    Succeeded,
}

impl OperationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationStatus::Pending => "pending",
            OperationStatus::Syncing => "syncing",
            OperationStatus::Failed => "failed",
            OperationStatus::Succeeded => "succeeded",
        }
    }
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a queued upload.
///
/// Fields default to empty when missing from persisted data so that an
/// incomplete entry still loads and is reported as a failed operation at sync
/// time rather than discarding the whole queue.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadPayload {
    pub name: String,
    /// Document body, base64 (standard alphabet, padded)
    pub content: String,
    pub description: String,
    pub mime_category: String,
    pub author: String,
    pub size: u64,
    pub file_type: String,
}

impl UploadPayload {
    /// Build a payload from an add-document request, encoding its body
    pub fn encode(document: &NewDocument) -> Self {
        Self {
            name: document.name.clone(),
            content: BASE64.encode(&document.content),
            description: document.description.clone(),
            mime_category: document.mime_category.clone(),
            author: document.author.clone(),
            size: document.size,
            file_type: document.file_type.clone(),
        }
    }

    /// Names of required fields that are empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.is_empty() {
            missing.push("name");
        }
        if self.content.is_empty() {
            missing.push("content");
        }
        if self.description.is_empty() {
            missing.push("description");
        }
        if self.mime_category.is_empty() {
            missing.push("mime_category");
        }
        if self.author.is_empty() {
            missing.push("author");
        }
        if self.size == 0 {
            missing.push("size");
        }
        if self.file_type.is_empty() {
            missing.push("file_type");
        }
        missing
    }

    /// Validate and decode back into an add-document request
    pub fn decode(&self) -> Result<NewDocument, SyncError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(SyncError::MissingUploadData(missing.join(", ")));
        }

        let content = BASE64
            .decode(&self.content)
            .map_err(|e| SyncError::CorruptContent(e.to_string()))?;

        Ok(NewDocument {
            name: self.name.clone(),
            content,
            description: self.description.clone(),
            mime_category: self.mime_category.clone(),
            author: self.author.clone(),
            size: self.size,
            file_type: self.file_type.clone(),
        })
    }
}

/// What a queued operation does
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OperationPayload {
    Upload(UploadPayload),
    Delete { document_id: DocumentId },
}

impl OperationPayload {
    /// Kind of this payload
    pub fn kind(&self) -> OperationKind {
        match self {
            OperationPayload::Upload(_) => OperationKind::Upload,
            OperationPayload::Delete { .. } => OperationKind::Delete,
        }
    }
}

/// A document mutation waiting in the offline queue
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedOperation {
    id: OperationId,
    status: OperationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    payload: OperationPayload,
}

impl QueuedOperation {
    /// Create a new pending operation with a fresh id
    pub(crate) fn new(payload: OperationPayload) -> Self {
        Self {
            id: OperationId::generate(payload.kind()),
            status: OperationStatus::Pending,
            error: None,
            payload,
        }
    }

    /// Unique id of this operation
    pub fn id(&self) -> &OperationId {
        &self.id
    }

    /// Upload or delete
    pub fn kind(&self) -> OperationKind {
        self.payload.kind()
    }

    /// Current status
    pub fn status(&self) -> OperationStatus {
        self.status
    }

    /// Failure reason; only present while `Failed`
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The immutable payload
    pub fn payload(&self) -> &OperationPayload {
        &self.payload
    }

    /// Name shown to the user for this operation
    pub fn display_name(&self) -> String {
        match &self.payload {
            OperationPayload::Upload(upload) if !upload.name.is_empty() => upload.name.clone(),
            OperationPayload::Upload(_) => "Document".to_string(),
            OperationPayload::Delete { document_id } => format!("Document #{document_id}"),
        }
    }

    /// Move to `status`. The error is kept only when the new status is `Failed`.
    pub(crate) fn set_status(&mut self, status: OperationStatus, error: Option<String>) {
        self.status = status;
        self.error = match status {
            OperationStatus::Failed => error,
            _ => None,
        };
    }

    pub(crate) fn regenerate_id(&mut self) {
        self.id = OperationId::generate(self.kind());
    }
}
