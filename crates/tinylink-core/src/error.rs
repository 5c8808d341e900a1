use thiserror::Error;

/// Result type for validation of core domain values.
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid short code: {0}")]
    InvalidShortCode(String),
    #[error("invalid session token: {0}")]
    InvalidSessionToken(String),
}
