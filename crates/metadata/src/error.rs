//! Token store error types.

use thiserror::Error;

/// Token store operation errors.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("no such token: {0}")]
    NoSuchToken(String),

    #[error("token id size must be at least 1 byte")]
    InvalidIdSize,

    #[error("entropy source unavailable: {0}")]
    RandomSource(String),

    #[error("database error: {0}")]
    Database(#[from] redb::Error),

    #[error("codec error: {0}")]
    Codec(#[from] tokendrop_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

// redb reports each transaction phase with its own error type; collapse them
// into the umbrella redb::Error so `?` works throughout the store.
impl From<redb::DatabaseError> for MetadataError {
    fn from(e: redb::DatabaseError) -> Self {
        Self::Database(e.into())
    }
}

impl From<redb::TransactionError> for MetadataError {
    fn from(e: redb::TransactionError) -> Self {
        Self::Database(e.into())
    }
}

impl From<redb::TableError> for MetadataError {
    fn from(e: redb::TableError) -> Self {
        Self::Database(e.into())
    }
}

impl From<redb::StorageError> for MetadataError {
    fn from(e: redb::StorageError) -> Self {
        Self::Database(e.into())
    }
}

impl From<redb::CommitError> for MetadataError {
    fn from(e: redb::CommitError) -> Self {
        Self::Database(e.into())
    }
}

/// Result type for token store operations.
pub type MetadataResult<T> = std::result::Result<T, MetadataError>;
