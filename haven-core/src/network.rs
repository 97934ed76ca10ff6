//! Network transport abstraction.
//!
//! The policy engine never talks to a transport directly. It calls a
//! [`Network`], which a host integration implements (see `haven-reqwest`),
//! and tests replace with a scripted mock.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::{Credentials, RequestDescriptor, RequestMode, Response};

/// Error raised when a fetch does not produce a response.
///
/// A response with an error status is *not* a `NetworkError`; only the
/// absence of any response is.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The network could not be reached (offline, DNS failure, refused connection).
    #[error("network unreachable: {0}")]
    Unreachable(String),

    /// The transport failed while the request was in flight.
    #[error(transparent)]
    Transport(Box<dyn std::error::Error + Send + Sync>),

    /// The request could not be turned into a transport request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Options for a single fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchOptions {
    /// Mode used for the outgoing fetch.
    pub mode: RequestMode,
    /// Credentials policy used for the outgoing fetch.
    pub credentials: Credentials,
}

impl FetchOptions {
    /// Fetch with the same mode as the intercepted request.
    pub fn for_request(request: &RequestDescriptor) -> Self {
        Self {
            mode: request.mode(),
            credentials: Credentials::default(),
        }
    }

    /// Cross-origin fetch that tolerates an opaque response.
    pub fn no_cors() -> Self {
        Self {
            mode: RequestMode::NoCors,
            credentials: Credentials::default(),
        }
    }

    /// Overrides the credentials policy.
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }
}

/// Transport used to reach the network.
///
/// # Examples
///
/// ```rust,ignore
/// use haven_core::{FetchOptions, Network, NetworkError, RequestDescriptor, Response};
///
/// struct Offline;
///
/// #[async_trait::async_trait]
/// impl Network for Offline {
///     async fn fetch(
///         &self,
///         _request: &RequestDescriptor,
///         _options: FetchOptions,
///     ) -> Result<Response, NetworkError> {
///         Err(NetworkError::Unreachable("offline".into()))
///     }
/// }
/// ```
#[async_trait]
pub trait Network: Send + Sync {
    /// Performs the fetch, resolving once the full response has been received.
    async fn fetch(
        &self,
        request: &RequestDescriptor,
        options: FetchOptions,
    ) -> Result<Response, NetworkError>;
}

#[async_trait]
impl<N> Network for Arc<N>
where
    N: Network + ?Sized,
{
    async fn fetch(
        &self,
        request: &RequestDescriptor,
        options: FetchOptions,
    ) -> Result<Response, NetworkError> {
        (**self).fetch(request, options).await
    }
}

#[async_trait]
impl Network for Box<dyn Network> {
    async fn fetch(
        &self,
        request: &RequestDescriptor,
        options: FetchOptions,
    ) -> Result<Response, NetworkError> {
        (**self).fetch(request, options).await
    }
}
