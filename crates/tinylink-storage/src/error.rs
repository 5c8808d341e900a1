use thiserror::Error;
use tinylink_core::ShortCode;

/// Result type for store and persistence operations.
pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("short code already exists: {0}")]
    Conflict(ShortCode),
    #[error("login already taken: {0}")]
    LoginTaken(String),
    #[error("storage I/O failed: {0}")]
    Io(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
}
