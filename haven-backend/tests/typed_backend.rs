//! Typed `CacheBackend` operations over a raw backend.

mod common;

use std::sync::Arc;

use bytes::Bytes;
use common::TestBackend;
use haven_backend::{Backend, BackendError, CacheBackend, DeleteStatus};
use haven_core::{CacheEntry, CacheKey, Opaque, Payload, Response};
use http::StatusCode;
use url::Url;

fn key(path: &str) -> CacheKey {
    CacheKey::get(&Url::parse("https://app.example/").unwrap().join(path).unwrap())
}

fn entry(body: &'static str) -> CacheEntry {
    CacheEntry::new(Response::from(Payload::new(StatusCode::OK, body)))
}

#[tokio::test]
async fn test_set_then_get_returns_same_entry() {
    let backend = TestBackend::new();
    let stored = entry("hello");

    backend.set("static-assets-v1", &key("/a.js"), &stored).await.unwrap();

    let read = backend.get("static-assets-v1", &key("/a.js")).await.unwrap();
    assert_eq!(read, Some(stored));
}

#[tokio::test]
async fn test_get_missing_key_and_namespace() {
    let backend = TestBackend::new();
    assert_eq!(backend.get("media-v1", &key("/x")).await.unwrap(), None);

    backend.open_namespace("media-v1").await.unwrap();
    assert_eq!(backend.get("media-v1", &key("/x")).await.unwrap(), None);
}

#[tokio::test]
async fn test_namespaces_are_isolated() {
    let backend = TestBackend::new();
    backend.set("static-assets-v1", &key("/a"), &entry("a")).await.unwrap();

    assert!(backend.get("media-v1", &key("/a")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_last_writer_wins() {
    let backend = TestBackend::new();
    backend.set("ns", &key("/a"), &entry("first")).await.unwrap();
    backend.set("ns", &key("/a"), &entry("second")).await.unwrap();

    let read = backend.get("ns", &key("/a")).await.unwrap().unwrap();
    let payload = read.response().as_readable().unwrap();
    assert_eq!(payload.body(), &Bytes::from_static(b"second"));
}

#[tokio::test]
async fn test_binary_format_stores_opaque_entries() {
    let backend = TestBackend::binary();
    let stored = CacheEntry::new(Response::from(Opaque::new(vec![1u8, 2, 3])));

    backend.set("media-v1", &key("/v"), &stored).await.unwrap();

    assert_eq!(backend.get("media-v1", &key("/v")).await.unwrap(), Some(stored));
}

#[tokio::test]
async fn test_corrupt_raw_value_surfaces_format_error() {
    let backend = TestBackend::new();
    backend
        .write("ns", &key("/bad"), Bytes::from_static(b"{oops"))
        .await
        .unwrap();

    let result = backend.get("ns", &key("/bad")).await;
    assert!(matches!(result, Err(BackendError::FormatError(_))));
}

#[tokio::test]
async fn test_delete_namespace_through_trait_object() {
    let backend: Arc<dyn Backend + Send + 'static> = Arc::new(TestBackend::new());
    backend.set("old-v0", &key("/a"), &entry("a")).await.unwrap();
    backend.set("old-v0", &key("/b"), &entry("b")).await.unwrap();

    assert_eq!(
        backend.delete_namespace("old-v0").await.unwrap(),
        DeleteStatus::Deleted(2)
    );
    assert_eq!(
        backend.delete_namespace("old-v0").await.unwrap(),
        DeleteStatus::Missing
    );
    assert!(backend.namespaces().await.unwrap().is_empty());
}
