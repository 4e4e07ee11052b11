use thiserror::Error;
use tinylink_core::{ShortCode, StorageError};

#[derive(Debug, Clone, Error)]
pub enum RedirectorError {
    #[error("short code not found: {0}")]
    NotFound(ShortCode),
    #[error("storage operation failed: {0}")]
    Storage(
        #[from]
        #[source]
        StorageError,
    ),
}

pub type Result<T> = std::result::Result<T, RedirectorError>;
