//! Error types for backend operations.

use crate::format::FormatError;
use thiserror::Error;

/// Error type for backend operations.
///
/// This enum categorizes errors that can occur during storage interactions
/// into distinct groups for appropriate handling.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Internal backend error, state or computation error.
    ///
    /// Any error not related to I/O with a remote or on-disk store.
    #[error(transparent)]
    InternalError(Box<dyn std::error::Error + Send>),

    /// The underlying store could not be reached or written.
    #[error(transparent)]
    ConnectionError(Box<dyn std::error::Error + Send>),

    /// Serialization or deserialization error.
    #[error(transparent)]
    FormatError(#[from] FormatError),
}

impl BackendError {
    /// Wraps any error as an [`BackendError::InternalError`].
    pub fn internal<E>(error: E) -> Self
    where
        E: std::error::Error + Send + 'static,
    {
        BackendError::InternalError(Box::new(error))
    }

    /// Wraps a failure of the underlying store as a
    /// [`BackendError::ConnectionError`].
    pub fn connection<E>(error: E) -> Self
    where
        E: std::error::Error + Send + 'static,
    {
        BackendError::ConnectionError(Box::new(error))
    }
}
