//! Moka backend implementation.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use haven_backend::format::{Format, JsonFormat};
use haven_backend::{Backend, BackendResult, DeleteStatus};
use haven_core::{BackendLabel, CacheKey, Raw};
use moka::future::Cache;
use smol_str::SmolStr;

use crate::builder::{MokaBackendBuilder, NamespaceTemplate};

/// In-memory namespace backend powered by Moka.
///
/// # Type Parameters
///
/// * `S` - Serialization format for stored entries. Default: [`JsonFormat`].
///
/// # Caveats
///
/// - Data is **not persisted**; use `haven-feoxdb` when entries must
///   survive a restart
/// - Capacity is enforced per namespace; size it so that normal operation
///   never evicts, since generation bumps are the intended way to drop entries
///
/// Cloning is cheap; clones share the same namespaces.
#[derive(Clone)]
pub struct MokaBackend<S = JsonFormat>
where
    S: Format,
{
    pub(crate) namespaces: Arc<DashMap<SmolStr, Cache<CacheKey, Raw>>>,
    pub(crate) template: NamespaceTemplate,
    pub(crate) serializer: S,
    pub(crate) label: BackendLabel,
}

impl<S> std::fmt::Debug for MokaBackend<S>
where
    S: Format,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaBackend")
            .field("label", &self.label)
            .field("namespaces", &self.namespaces.len())
            .field("serializer", &self.serializer)
            .finish()
    }
}

impl MokaBackend<JsonFormat> {
    /// Creates a new builder for `MokaBackend`.
    pub fn builder() -> MokaBackendBuilder<JsonFormat> {
        MokaBackendBuilder::default()
    }
}

impl<S> MokaBackend<S>
where
    S: Format,
{
    /// Runs Moka's pending maintenance tasks on every namespace.
    ///
    /// Entry counts and evictions are eventually consistent in Moka; tests
    /// call this before asserting on them.
    pub async fn run_pending_tasks(&self) {
        let caches: Vec<_> = self.namespaces.iter().map(|e| e.value().clone()).collect();
        for cache in caches {
            cache.run_pending_tasks().await;
        }
    }

    fn namespace(&self, name: &str) -> Option<Cache<CacheKey, Raw>> {
        self.namespaces.get(name).map(|e| e.value().clone())
    }

    fn namespace_or_create(&self, name: &str) -> Cache<CacheKey, Raw> {
        self.namespaces
            .entry(SmolStr::new(name))
            .or_insert_with(|| {
                tracing::debug!(namespace = name, "creating namespace");
                self.template.build()
            })
            .value()
            .clone()
    }
}

#[async_trait]
impl<S> Backend for MokaBackend<S>
where
    S: Format,
{
    async fn read(&self, namespace: &str, key: &CacheKey) -> BackendResult<Option<Raw>> {
        match self.namespace(namespace) {
            Some(cache) => Ok(cache.get(key).await),
            None => Ok(None),
        }
    }

    async fn write(&self, namespace: &str, key: &CacheKey, value: Raw) -> BackendResult<()> {
        let cache = self.namespace_or_create(namespace);
        cache.insert(key.clone(), value).await;
        Ok(())
    }

    async fn remove(&self, namespace: &str, key: &CacheKey) -> BackendResult<DeleteStatus> {
        let Some(cache) = self.namespace(namespace) else {
            return Ok(DeleteStatus::Missing);
        };
        match cache.remove(key).await {
            Some(_) => Ok(DeleteStatus::Deleted(1)),
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn open_namespace(&self, namespace: &str) -> BackendResult<()> {
        self.namespace_or_create(namespace);
        Ok(())
    }

    async fn namespaces(&self) -> BackendResult<Vec<SmolStr>> {
        Ok(self.namespaces.iter().map(|e| e.key().clone()).collect())
    }

    async fn delete_namespace(&self, namespace: &str) -> BackendResult<DeleteStatus> {
        match self.namespaces.remove(namespace) {
            Some((_, cache)) => {
                let entries = cache.iter().count();
                cache.invalidate_all();
                Ok(DeleteStatus::Deleted(entries.try_into().unwrap_or(u32::MAX)))
            }
            None => Ok(DeleteStatus::Missing),
        }
    }

    async fn keys(&self, namespace: &str) -> BackendResult<Vec<CacheKey>> {
        Ok(self
            .namespace(namespace)
            .map(|cache| cache.iter().map(|(key, _)| (*key).clone()).collect())
            .unwrap_or_default())
    }

    fn label(&self) -> BackendLabel {
        self.label.clone()
    }

    fn value_format(&self) -> &dyn Format {
        &self.serializer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use url::Url;

    fn key(path: &str) -> CacheKey {
        CacheKey::get(&Url::parse("https://app.example/").unwrap().join(path).unwrap())
    }

    #[tokio::test]
    async fn test_write_creates_namespace() {
        let backend = MokaBackend::builder().build();
        backend
            .write("media-v1", &key("/v"), Bytes::from_static(b"v"))
            .await
            .unwrap();

        assert_eq!(backend.namespaces().await.unwrap(), vec![SmolStr::new("media-v1")]);
        assert_eq!(
            backend.read("media-v1", &key("/v")).await.unwrap(),
            Some(Bytes::from_static(b"v"))
        );
    }

    #[tokio::test]
    async fn test_read_missing_namespace_does_not_create_it() {
        let backend = MokaBackend::builder().build();
        assert_eq!(backend.read("nope", &key("/v")).await.unwrap(), None);
        assert!(backend.namespaces().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove() {
        let backend = MokaBackend::builder().build();
        backend
            .write("ns", &key("/a"), Bytes::from_static(b"a"))
            .await
            .unwrap();

        assert_eq!(
            backend.remove("ns", &key("/a")).await.unwrap(),
            DeleteStatus::Deleted(1)
        );
        assert_eq!(
            backend.remove("ns", &key("/a")).await.unwrap(),
            DeleteStatus::Missing
        );
        assert_eq!(
            backend.remove("other", &key("/a")).await.unwrap(),
            DeleteStatus::Missing
        );
    }

    #[tokio::test]
    async fn test_builder_with_label() {
        let backend = MokaBackend::builder().label("memory").build();
        assert_eq!(backend.label().as_str(), "memory");
    }
}
