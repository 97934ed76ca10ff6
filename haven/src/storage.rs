//! Store adapter over a namespace [`Backend`].
//!
//! [`CacheStorage`] hands out a [`Store`] per [`Purpose`]; a `Store` is the
//! only way the agent reads or writes entries. It enforces the storage rules
//! shared by every executor:
//!
//! - only `GET` requests are looked up or stored;
//! - a `206 Partial Content` response or one with `Vary: *` is never stored;
//! - an entry is written only once the complete response is in hand.

use std::sync::Arc;

use futures::future::join_all;
use haven_backend::{Backend, CacheBackend, DeleteStatus};
use haven_core::{CacheEntry, CacheKey, FetchOptions, Network, RequestDescriptor, Response};
use tracing::debug;
use url::Url;

use crate::error::HavenError;
use crate::namespace::{CacheNamespace, NamespaceRegistry, Purpose};

/// Backend shared by every store of an agent.
pub type SharedBackend = Arc<dyn Backend + Send + 'static>;

/// Opens the store of each purpose.
#[derive(Clone)]
pub struct CacheStorage {
    backend: SharedBackend,
    registry: NamespaceRegistry,
}

impl CacheStorage {
    /// Creates storage over `backend` using the registry's current namespaces.
    pub fn new(backend: SharedBackend, registry: NamespaceRegistry) -> Self {
        Self { backend, registry }
    }

    /// Returns a handle to the current store for `purpose` without touching
    /// the backend. The namespace is created by its first write.
    pub fn store(&self, purpose: Purpose) -> Store {
        Store {
            backend: self.backend.clone(),
            namespace: self.registry.current(purpose).clone(),
        }
    }

    /// Returns the current store for `purpose`, creating its namespace.
    pub async fn open(&self, purpose: Purpose) -> Result<Store, HavenError> {
        let store = self.store(purpose);
        self.backend.open_namespace(store.namespace.name()).await?;
        Ok(store)
    }

    /// The namespace registry.
    pub fn registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    /// The underlying backend.
    pub fn backend(&self) -> &SharedBackend {
        &self.backend
    }
}

impl std::fmt::Debug for CacheStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStorage")
            .field("backend", &self.backend.label())
            .field("registry", &self.registry)
            .finish()
    }
}

/// One namespace, seen through the storage rules.
#[derive(Clone)]
pub struct Store {
    backend: SharedBackend,
    namespace: CacheNamespace,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.backend.label())
            .field("namespace", &self.namespace)
            .finish()
    }
}

fn check_storable(url: &Url, response: &Response) -> Result<(), HavenError> {
    if response.is_storable() {
        Ok(())
    } else {
        Err(HavenError::NotStorable {
            url: url.to_string(),
            reason: "partial content or Vary: *",
        })
    }
}

impl Store {
    /// The namespace this store reads and writes.
    pub fn namespace(&self) -> &CacheNamespace {
        &self.namespace
    }

    /// Looks up the entry for a request. Non-`GET` requests never match.
    pub async fn match_request(
        &self,
        request: &RequestDescriptor,
    ) -> Result<Option<CacheEntry>, HavenError> {
        if !request.is_get() {
            return Ok(None);
        }
        self.match_key(&CacheKey::for_request(request)).await
    }

    /// Looks up the entry for the `GET` request of `url`.
    pub async fn match_url(&self, url: &Url) -> Result<Option<CacheEntry>, HavenError> {
        self.match_key(&CacheKey::get(url)).await
    }

    async fn match_key(&self, key: &CacheKey) -> Result<Option<CacheEntry>, HavenError> {
        Ok(self.backend.get(self.namespace.name(), key).await?)
    }

    /// Stores `response` for `request`, replacing any previous entry.
    pub async fn put(
        &self,
        request: &RequestDescriptor,
        response: Response,
    ) -> Result<(), HavenError> {
        if !request.is_get() {
            return Err(HavenError::NotStorable {
                url: request.url().to_string(),
                reason: "only GET requests can be stored",
            });
        }
        check_storable(request.url(), &response)?;
        let key = CacheKey::for_request(request);
        self.backend
            .set(self.namespace.name(), &key, &CacheEntry::new(response))
            .await?;
        debug!(namespace = %self.namespace, %key, "stored entry");
        Ok(())
    }

    /// Fetches every URL and stores all responses, or stores nothing.
    ///
    /// All fetches run concurrently. If any fetch fails, returns a non-2xx
    /// status, is opaque or is not storable, the call fails with
    /// [`HavenError::Install`] and no entry is written.
    pub async fn add_all(&self, network: &dyn Network, urls: &[Url]) -> Result<usize, HavenError> {
        let fetches = urls.iter().map(|url| async move {
            let request = RequestDescriptor::new(url.clone());
            let result = network
                .fetch(&request, FetchOptions::for_request(&request))
                .await;
            (request, result)
        });

        let mut fetched = Vec::with_capacity(urls.len());
        for (request, result) in join_all(fetches).await {
            let install_error = |reason: String| HavenError::Install {
                url: request.url().clone(),
                reason,
            };
            let response = result.map_err(|e| install_error(e.to_string()))?;
            match response.status() {
                Some(status) if status.is_success() => {}
                Some(status) => return Err(install_error(format!("status {status}"))),
                None => return Err(install_error("opaque response".to_owned())),
            }
            check_storable(request.url(), &response).map_err(|e| install_error(e.to_string()))?;
            fetched.push((request, response));
        }

        let count = fetched.len();
        for (request, response) in fetched {
            self.put(&request, response).await?;
        }
        Ok(count)
    }

    /// Removes the entry for `url`. Returns whether it existed.
    pub async fn delete(&self, url: &Url) -> Result<bool, HavenError> {
        let status = self
            .backend
            .remove(self.namespace.name(), &CacheKey::get(url))
            .await?;
        Ok(matches!(status, DeleteStatus::Deleted(_)))
    }

    /// Keys of every stored entry.
    pub async fn keys(&self) -> Result<Vec<CacheKey>, HavenError> {
        Ok(self.backend.keys(self.namespace.name()).await?)
    }

    /// Number of stored entries.
    pub async fn len(&self) -> Result<usize, HavenError> {
        Ok(self.keys().await?.len())
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> Result<bool, HavenError> {
        Ok(self.len().await? == 0)
    }
}
