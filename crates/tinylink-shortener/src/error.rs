use thiserror::Error;
use tinylink_core::{CoreError, ShortCode};
use tinylink_storage::StorageError;

pub type Result<T> = std::result::Result<T, ShortenerError>;

#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("login already exists: {0}")]
    AlreadyExists(String),
    #[error("invalid login or password")]
    InvalidCredentials,
    #[error("unknown session token")]
    UnknownSession,
    #[error("short code not found: {0}")]
    NotFound(ShortCode),
    #[error("link has expired: {0}")]
    Expired(ShortCode),
    #[error("link has no clicks left: {0}")]
    QuotaExhausted(ShortCode),
    #[error("no free short code after {attempts} attempts")]
    CodeGenerationExhausted { attempts: usize },
    #[error("storage error: {0}")]
    Storage(StorageError),
}

impl From<StorageError> for ShortenerError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::LoginTaken(login) => Self::AlreadyExists(login),
            other => Self::Storage(other),
        }
    }
}

impl From<CoreError> for ShortenerError {
    fn from(value: CoreError) -> Self {
        Self::InvalidInput(value.to_string())
    }
}
