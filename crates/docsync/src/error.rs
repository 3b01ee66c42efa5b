//! Error types for the document sync crate.

use crate::remote::RemoteError;
use thiserror::Error;

/// Result type alias for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors returned when an operation cannot be queued.
#[derive(Error, Debug)]
pub enum QueueError {
    /// The document body exceeds the configured offline upload ceiling.
    #[error("Document is too large to queue offline: {size} bytes (limit {limit} bytes)")]
    PayloadTooLarge { size: usize, limit: usize },

    /// The queue could not be written to durable storage.
    #[error("Storage error: {0}")]
    Storage(#[from] store::StoreError),

    /// The queue could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Why a queued operation failed during a sync pass.
///
/// The display text becomes the operation's `error` field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// Required upload fields were missing from the queued payload.
    #[error("Missing upload data: {0}")]
    MissingUploadData(String),

    /// The queued body could not be decoded.
    #[error("Corrupt upload content: {0}")]
    CorruptContent(String),

    /// The remote service rejected the call.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Result type alias for controller mutations.
pub type ControllerResult<T> = Result<T, ControllerError>;

/// Errors surfaced to the initiator of a user mutation.
#[derive(Error, Debug)]
pub enum ControllerError {
    /// Immediate execution was rejected; the mutation was not queued.
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// The mutation could not be queued.
    #[error(transparent)]
    Queue(#[from] QueueError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_sync_error_keeps_message() {
        let err: SyncError = RemoteError::Rejected("not found".to_string()).into();
        assert_eq!(err.to_string(), "not found");
    }

    #[test]
    fn test_payload_too_large_message() {
        let err = QueueError::PayloadTooLarge {
            size: 3_000_000,
            limit: 2_097_152,
        };
        assert_eq!(
            err.to_string(),
            "Document is too large to queue offline: 3000000 bytes (limit 2097152 bytes)"
        );
    }
}
