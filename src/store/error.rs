use thiserror::Error;

/// Errors from the persistent store.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    /// The backing medium failed to read or write.
    #[error("I/O error: {0}")]
    Io(String),

    /// A value could not be encoded for storage.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Stored bytes exist but cannot be decoded.
    #[error("corrupt data: {0}")]
    Corrupt(String),
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
