use bincode::error::{DecodeError, EncodeError};
use feoxdb::FeoxError;
use thiserror::Error;

/// Errors that can occur when using [`FeOxDbBackend`](crate::FeOxDbBackend).
#[derive(Debug, Error)]
pub enum FeOxDbError {
    /// An error from the underlying FeOxDB database.
    #[error("FeOxDB error: {0}")]
    FeOxDb(#[from] FeoxError),

    /// Failed to serialize a key or index record.
    #[error("Serialization error: {0}")]
    Serialization(#[from] EncodeError),

    /// Failed to deserialize a key or index record.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] DecodeError),

    /// The blocking storage task panicked or was cancelled.
    #[error("storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
