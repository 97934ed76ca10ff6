use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use feoxdb::{FeoxError, FeoxStore};
use haven_backend::format::{Format, JsonFormat};
use haven_backend::{Backend, BackendError, BackendResult, DeleteStatus};
use haven_core::{BackendLabel, CacheKey, Raw};
use smol_str::SmolStr;
use tokio::sync::Mutex;

use crate::{FeOxDbError, index};

/// Disk-based namespace backend using FeOxDB.
///
/// Use this when precached assets must still be there after a restart.
/// For tests and short-lived agents, prefer `MokaBackend`.
///
/// ```no_run
/// use haven_feoxdb::FeOxDbBackend;
///
/// let backend = FeOxDbBackend::builder()
///     .path("/var/lib/myapp/offline")
///     .max_file_size(512 * 1024 * 1024)
///     .build()?;
/// # Ok::<(), haven_feoxdb::FeOxDbError>(())
/// ```
///
/// Cloning is cheap; clones share the same underlying database.
#[derive(Clone)]
pub struct FeOxDbBackend<S = JsonFormat>
where
    S: Format,
{
    store: Arc<FeoxStore>,
    index_lock: Arc<Mutex<()>>,
    serializer: S,
    label: BackendLabel,
}

impl<S> FeOxDbBackend<S>
where
    S: Format,
{
    /// Forces pending writes to disk.
    ///
    /// FeOxDB buffers writes and flushes them in the background. No-op in
    /// memory-only mode.
    pub fn flush(&self) -> Result<(), FeOxDbError> {
        self.store.flush()?;
        Ok(())
    }

    async fn blocking<T, F>(&self, op: F) -> BackendResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&FeoxStore) -> Result<T, FeOxDbError> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || op(&store))
            .await
            .map_err(FeOxDbError::from)
            .and_then(|result| result)
            .map_err(into_backend_error)
    }

    /// Like [`Self::blocking`], holding the index lock for the whole operation.
    async fn blocking_locked<T, F>(&self, op: F) -> BackendResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&FeoxStore) -> Result<T, FeOxDbError> + Send + 'static,
    {
        let guard = self.index_lock.clone().lock_owned().await;
        self.blocking(move |store| {
            let result = op(store);
            drop(guard);
            result
        })
        .await
    }
}

fn into_backend_error(error: FeOxDbError) -> BackendError {
    match error {
        FeOxDbError::FeOxDb(_) => BackendError::connection(error),
        _ => BackendError::internal(error),
    }
}

impl FeOxDbBackend<JsonFormat> {
    /// Starts building a new backend.
    pub fn builder() -> FeOxDbBackendBuilder<JsonFormat> {
        FeOxDbBackendBuilder::default()
    }

    /// In-memory backend for tests. Data is lost when dropped.
    pub fn in_memory() -> Result<Self, FeOxDbError> {
        FeOxDbBackendBuilder::default().build()
    }
}

/// Builder for [`FeOxDbBackend`].
pub struct FeOxDbBackendBuilder<S = JsonFormat>
where
    S: Format,
{
    path: Option<PathBuf>,
    max_file_size: Option<u64>,
    max_memory: Option<usize>,
    serializer: S,
    label: BackendLabel,
}

impl Default for FeOxDbBackendBuilder<JsonFormat> {
    fn default() -> Self {
        Self {
            path: None,
            max_file_size: None,
            max_memory: None,
            serializer: JsonFormat,
            label: BackendLabel::new_static("feoxdb"),
        }
    }
}

impl<S> FeOxDbBackendBuilder<S>
where
    S: Format,
{
    /// Enables persistent storage at the given path.
    ///
    /// Without this, data lives only in memory. If the path is a directory,
    /// `offline.db` is created inside it.
    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Pre-allocates disk space and caps maximum storage.
    ///
    /// Default: 1 GB
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = Some(bytes);
        self
    }

    /// Limits RAM usage. FeOxDB never evicts; writes fail when full.
    pub fn max_memory(mut self, bytes: usize) -> Self {
        self.max_memory = Some(bytes);
        self
    }

    /// Name reported in log fields and response sources.
    pub fn label(mut self, label: impl Into<BackendLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Entry serialization format. `BincodeFormat` is more compact;
    /// `JsonFormat` (default) keeps stored entries readable.
    pub fn value_format<NewS>(self, serializer: NewS) -> FeOxDbBackendBuilder<NewS>
    where
        NewS: Format,
    {
        FeOxDbBackendBuilder {
            path: self.path,
            max_file_size: self.max_file_size,
            max_memory: self.max_memory,
            serializer,
            label: self.label,
        }
    }

    /// Opens or creates the database.
    pub fn build(self) -> Result<FeOxDbBackend<S>, FeOxDbError> {
        let mut builder = FeoxStore::builder();

        if let Some(mut path) = self.path {
            if path.is_dir() {
                path.push("offline.db");
            }
            builder = builder.device_path(path.to_string_lossy().to_string());
        }
        if let Some(file_size) = self.max_file_size {
            builder = builder.file_size(file_size);
        }
        if let Some(memory) = self.max_memory {
            builder = builder.max_memory(memory);
        }

        let store = builder.build()?;
        tracing::debug!(label = %self.label, "opened feoxdb store");

        Ok(FeOxDbBackend {
            store: Arc::new(store),
            index_lock: Arc::new(Mutex::new(())),
            serializer: self.serializer,
            label: self.label,
        })
    }
}

#[async_trait]
impl<S> Backend for FeOxDbBackend<S>
where
    S: Format,
{
    async fn read(&self, namespace: &str, key: &CacheKey) -> BackendResult<Option<Raw>> {
        let record = index::entry_record(namespace, key).map_err(into_backend_error)?;
        self.blocking(move |store| match store.get(&record) {
            Ok(bytes) => Ok(Some(Raw::from(bytes))),
            Err(FeoxError::KeyNotFound) => Ok(None),
            Err(e) => Err(e.into()),
        })
        .await
    }

    async fn write(&self, namespace: &str, key: &CacheKey, value: Raw) -> BackendResult<()> {
        let namespace = namespace.to_owned();
        let key = key.clone();
        self.blocking_locked(move |store| {
            let record = index::entry_record(&namespace, &key)?;
            store.insert(&record, &value)?;
            index::register(store, &namespace, &key)
        })
        .await
    }

    async fn remove(&self, namespace: &str, key: &CacheKey) -> BackendResult<DeleteStatus> {
        let namespace = namespace.to_owned();
        let key = key.clone();
        self.blocking_locked(move |store| {
            let record = index::entry_record(&namespace, &key)?;
            if !store.contains_key(&record) {
                return Ok(DeleteStatus::Missing);
            }
            store.delete(&record)?;
            index::unregister(store, &namespace, &key)?;
            Ok(DeleteStatus::Deleted(1))
        })
        .await
    }

    async fn open_namespace(&self, namespace: &str) -> BackendResult<()> {
        let namespace = namespace.to_owned();
        self.blocking_locked(move |store| index::open(store, &namespace))
            .await
    }

    async fn namespaces(&self) -> BackendResult<Vec<SmolStr>> {
        self.blocking(|store| {
            Ok(index::namespaces(store)?
                .into_iter()
                .map(SmolStr::from)
                .collect())
        })
        .await
    }

    async fn delete_namespace(&self, namespace: &str) -> BackendResult<DeleteStatus> {
        let namespace = namespace.to_owned();
        let status = self
            .blocking_locked(move |store| {
                Ok(match index::drop_namespace(store, &namespace)? {
                    Some(removed) => DeleteStatus::Deleted(removed),
                    None => DeleteStatus::Missing,
                })
            })
            .await?;
        tracing::debug!(label = %self.label, ?status, "deleted namespace");
        Ok(status)
    }

    async fn keys(&self, namespace: &str) -> BackendResult<Vec<CacheKey>> {
        let namespace = namespace.to_owned();
        self.blocking(move |store| Ok(index::keys(store, &namespace)?.into_iter().collect()))
            .await
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
    use tempfile::TempDir;
    use url::Url;

    fn key(path: &str) -> CacheKey {
        CacheKey::get(&Url::parse("https://app.example/").unwrap().join(path).unwrap())
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let backend = FeOxDbBackend::builder()
            .path(temp_dir.path())
            .build()
            .unwrap();

        backend
            .write("static-assets-v1", &key("/index.html"), Bytes::from_static(b"page"))
            .await
            .unwrap();

        let result = backend
            .read("static-assets-v1", &key("/index.html"))
            .await
            .unwrap();
        assert_eq!(result, Some(Bytes::from_static(b"page")));
    }

    #[tokio::test]
    async fn test_same_key_in_other_namespace_is_separate() {
        let backend = FeOxDbBackend::in_memory().unwrap();
        backend
            .write("a", &key("/x"), Bytes::from_static(b"a"))
            .await
            .unwrap();

        assert_eq!(backend.read("b", &key("/x")).await.unwrap(), None);
        assert_eq!(backend.keys("b").await.unwrap(), vec![]);
    }

    #[tokio::test]
    async fn test_remove() {
        let backend = FeOxDbBackend::in_memory().unwrap();
        backend
            .write("ns", &key("/x"), Bytes::from_static(b"x"))
            .await
            .unwrap();

        assert_eq!(
            backend.remove("ns", &key("/x")).await.unwrap(),
            DeleteStatus::Deleted(1)
        );
        assert_eq!(
            backend.remove("ns", &key("/x")).await.unwrap(),
            DeleteStatus::Missing
        );
        assert!(backend.keys("ns").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_namespace_removes_entries() {
        let backend = FeOxDbBackend::in_memory().unwrap();
        for path in ["/a", "/b"] {
            backend
                .write("media-v0", &key(path), Bytes::from_static(b"v"))
                .await
                .unwrap();
        }
        backend
            .write("media-v1", &key("/a"), Bytes::from_static(b"keep"))
            .await
            .unwrap();

        assert_eq!(
            backend.delete_namespace("media-v0").await.unwrap(),
            DeleteStatus::Deleted(2)
        );
        assert_eq!(
            backend.delete_namespace("media-v0").await.unwrap(),
            DeleteStatus::Missing
        );
        assert_eq!(backend.read("media-v0", &key("/a")).await.unwrap(), None);
        assert_eq!(
            backend.read("media-v1", &key("/a")).await.unwrap(),
            Some(Bytes::from_static(b"keep"))
        );
        assert_eq!(
            backend.namespaces().await.unwrap(),
            vec![SmolStr::new("media-v1")]
        );
    }

    #[tokio::test]
    async fn test_open_namespace_is_listed_while_empty() {
        let backend = FeOxDbBackend::in_memory().unwrap();
        backend.open_namespace("static-assets-v1").await.unwrap();
        backend.open_namespace("static-assets-v1").await.unwrap();

        assert_eq!(
            backend.namespaces().await.unwrap(),
            vec![SmolStr::new("static-assets-v1")]
        );
        assert!(backend.keys("static-assets-v1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clone_shares_store() {
        let backend1 = FeOxDbBackend::in_memory().unwrap();
        let backend2 = backend1.clone();

        backend1
            .write("ns", &key("/shared"), Bytes::from_static(b"s"))
            .await
            .unwrap();
        assert_eq!(
            backend2.read("ns", &key("/shared")).await.unwrap(),
            Some(Bytes::from_static(b"s"))
        );
    }

    #[tokio::test]
    async fn test_concurrent_writes_keep_every_key_indexed() {
        let backend = FeOxDbBackend::in_memory().unwrap();
        let writes = (0..16).map(|i| {
            let backend = backend.clone();
            tokio::spawn(async move {
                backend
                    .write("ns", &key(&format!("/{i}")), Bytes::from(vec![i as u8]))
                    .await
            })
        });
        for handle in writes.collect::<Vec<_>>() {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(backend.keys("ns").await.unwrap().len(), 16);
    }

    #[test]
    fn test_flush_in_memory_succeeds() {
        let backend = FeOxDbBackend::in_memory().unwrap();
        assert!(backend.flush().is_ok());
    }

    #[test]
    fn test_store_failures_map_to_connection_errors() {
        let store = into_backend_error(FeOxDbError::FeOxDb(FeoxError::KeyNotFound));
        assert!(matches!(store, BackendError::ConnectionError(_)));

        let encode = into_backend_error(FeOxDbError::Serialization(
            bincode::error::EncodeError::Other("bad record"),
        ));
        assert!(matches!(encode, BackendError::InternalError(_)));
    }
}
