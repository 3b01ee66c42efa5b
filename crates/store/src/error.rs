//! Error types for storage operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage quota exceeded for key {key}: {len} bytes (limit {limit})")]
    QuotaExceeded { key: String, len: usize, limit: usize },
}

pub type Result<T> = std::result::Result<T, StoreError>;
