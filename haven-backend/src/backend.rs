use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use haven_core::{BackendLabel, CacheEntry, CacheKey, Raw};
use smol_str::SmolStr;

use crate::{
    BackendError, DeleteStatus,
    format::{Format, JsonFormat},
};

pub type BackendResult<T> = Result<T, BackendError>;

/// Raw storage organized in named namespaces.
///
/// Writing into a namespace that does not exist yet creates it. Every
/// operation on a single key is atomic from the caller's point of view;
/// concurrent writes to the same key resolve as last-writer-wins.
#[async_trait]
pub trait Backend: Sync + Send {
    async fn read(&self, namespace: &str, key: &CacheKey) -> BackendResult<Option<Raw>>;

    async fn write(&self, namespace: &str, key: &CacheKey, value: Raw) -> BackendResult<()>;

    async fn remove(&self, namespace: &str, key: &CacheKey) -> BackendResult<DeleteStatus>;

    /// Creates the namespace if it does not exist.
    async fn open_namespace(&self, namespace: &str) -> BackendResult<()>;

    /// Names of all existing namespaces.
    async fn namespaces(&self) -> BackendResult<Vec<SmolStr>>;

    /// Deletes a namespace together with all of its entries.
    async fn delete_namespace(&self, namespace: &str) -> BackendResult<DeleteStatus>;

    /// Keys stored in a namespace. Empty for a missing namespace.
    async fn keys(&self, namespace: &str) -> BackendResult<Vec<CacheKey>>;

    /// Returns the label of this backend for log fields and response sources.
    fn label(&self) -> BackendLabel {
        BackendLabel::new_static("backend")
    }

    fn value_format(&self) -> &dyn Format {
        &JsonFormat
    }
}

#[async_trait]
impl Backend for &dyn Backend {
    async fn read(&self, namespace: &str, key: &CacheKey) -> BackendResult<Option<Raw>> {
        (*self).read(namespace, key).await
    }

    async fn write(&self, namespace: &str, key: &CacheKey, value: Raw) -> BackendResult<()> {
        (*self).write(namespace, key, value).await
    }

    async fn remove(&self, namespace: &str, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (*self).remove(namespace, key).await
    }

    async fn open_namespace(&self, namespace: &str) -> BackendResult<()> {
        (*self).open_namespace(namespace).await
    }

    async fn namespaces(&self) -> BackendResult<Vec<SmolStr>> {
        (*self).namespaces().await
    }

    async fn delete_namespace(&self, namespace: &str) -> BackendResult<DeleteStatus> {
        (*self).delete_namespace(namespace).await
    }

    async fn keys(&self, namespace: &str) -> BackendResult<Vec<CacheKey>> {
        (*self).keys(namespace).await
    }

    fn label(&self) -> BackendLabel {
        (*self).label()
    }

    fn value_format(&self) -> &dyn Format {
        (*self).value_format()
    }
}

#[async_trait]
impl Backend for Box<dyn Backend> {
    async fn read(&self, namespace: &str, key: &CacheKey) -> BackendResult<Option<Raw>> {
        (**self).read(namespace, key).await
    }

    async fn write(&self, namespace: &str, key: &CacheKey, value: Raw) -> BackendResult<()> {
        (**self).write(namespace, key, value).await
    }

    async fn remove(&self, namespace: &str, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (**self).remove(namespace, key).await
    }

    async fn open_namespace(&self, namespace: &str) -> BackendResult<()> {
        (**self).open_namespace(namespace).await
    }

    async fn namespaces(&self) -> BackendResult<Vec<SmolStr>> {
        (**self).namespaces().await
    }

    async fn delete_namespace(&self, namespace: &str) -> BackendResult<DeleteStatus> {
        (**self).delete_namespace(namespace).await
    }

    async fn keys(&self, namespace: &str) -> BackendResult<Vec<CacheKey>> {
        (**self).keys(namespace).await
    }

    fn label(&self) -> BackendLabel {
        (**self).label()
    }

    fn value_format(&self) -> &dyn Format {
        (**self).value_format()
    }
}

#[async_trait]
impl Backend for Arc<dyn Backend + Send + 'static> {
    async fn read(&self, namespace: &str, key: &CacheKey) -> BackendResult<Option<Raw>> {
        (**self).read(namespace, key).await
    }

    async fn write(&self, namespace: &str, key: &CacheKey, value: Raw) -> BackendResult<()> {
        (**self).write(namespace, key, value).await
    }

    async fn remove(&self, namespace: &str, key: &CacheKey) -> BackendResult<DeleteStatus> {
        (**self).remove(namespace, key).await
    }

    async fn open_namespace(&self, namespace: &str) -> BackendResult<()> {
        (**self).open_namespace(namespace).await
    }

    async fn namespaces(&self) -> BackendResult<Vec<SmolStr>> {
        (**self).namespaces().await
    }

    async fn delete_namespace(&self, namespace: &str) -> BackendResult<DeleteStatus> {
        (**self).delete_namespace(namespace).await
    }

    async fn keys(&self, namespace: &str) -> BackendResult<Vec<CacheKey>> {
        (**self).keys(namespace).await
    }

    fn label(&self) -> BackendLabel {
        (**self).label()
    }

    fn value_format(&self) -> &dyn Format {
        (**self).value_format()
    }
}

/// High-level backend trait with typed operations.
///
/// Provides `get` and `set` over [`CacheEntry`] values, handling
/// serialization through the backend's [`Format`].
pub trait CacheBackend: Backend {
    fn get(
        &self,
        namespace: &str,
        key: &CacheKey,
    ) -> impl Future<Output = BackendResult<Option<CacheEntry>>> + Send {
        async move {
            match self.read(namespace, key).await? {
                Some(raw) => {
                    let entry = self.value_format().decode(&raw)?;
                    tracing::trace!(%namespace, %key, bytes = raw.len(), "entry read");
                    Ok(Some(entry))
                }
                None => Ok(None),
            }
        }
    }

    fn set(
        &self,
        namespace: &str,
        key: &CacheKey,
        entry: &CacheEntry,
    ) -> impl Future<Output = BackendResult<()>> + Send {
        async move {
            let raw = self.value_format().encode(entry)?;
            let bytes_written = raw.len();
            self.write(namespace, key, raw).await?;
            tracing::trace!(%namespace, %key, bytes = bytes_written, "entry written");
            Ok(())
        }
    }
}

impl<B> CacheBackend for B where B: Backend + ?Sized {}
