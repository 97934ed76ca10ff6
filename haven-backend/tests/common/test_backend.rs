//! Simple in-memory test backend implementation using DashMap.

use async_trait::async_trait;
use dashmap::DashMap;
use haven_backend::format::{BincodeFormat, Format, JsonFormat};
use haven_backend::{Backend, BackendResult, DeleteStatus};
use haven_core::{CacheKey, Raw};
use smol_str::SmolStr;
use std::sync::Arc;

type Namespace = DashMap<CacheKey, Raw>;

/// Simple in-memory backend for testing using DashMap.
///
/// This backend is thread-safe and can be cloned cheaply (Arc internally).
#[derive(Clone)]
pub struct TestBackend {
    namespaces: Arc<DashMap<SmolStr, Arc<Namespace>>>,
    binary: bool,
}

impl TestBackend {
    /// Create a new empty test backend using the JSON format.
    pub fn new() -> Self {
        Self {
            namespaces: Arc::new(DashMap::new()),
            binary: false,
        }
    }

    /// Create a new empty test backend using the bincode format.
    pub fn binary() -> Self {
        Self {
            binary: true,
            ..Self::new()
        }
    }

    /// Get raw stored bytes for inspection.
    pub fn get_raw(&self, namespace: &str, key: &CacheKey) -> Option<Raw> {
        self.namespaces
            .get(namespace)
            .and_then(|ns| ns.get(key).map(|v| v.clone()))
    }

    fn namespace(&self, name: &str) -> Arc<Namespace> {
        self.namespaces
            .entry(SmolStr::new(name))
            .or_insert_with(|| Arc::new(DashMap::new()))
            .clone()
    }
}

#[async_trait]
impl Backend for TestBackend {
    async fn read(&self, namespace: &str, key: &CacheKey) -> BackendResult<Option<Raw>> {
        Ok(self.get_raw(namespace, key))
    }

    async fn write(&self, namespace: &str, key: &CacheKey, value: Raw) -> BackendResult<()> {
        self.namespace(namespace).insert(key.clone(), value);
        Ok(())
    }

    async fn remove(&self, namespace: &str, key: &CacheKey) -> BackendResult<DeleteStatus> {
        let removed = self
            .namespaces
            .get(namespace)
            .is_some_and(|ns| ns.remove(key).is_some());
        Ok(if removed {
            DeleteStatus::Deleted(1)
        } else {
            DeleteStatus::Missing
        })
    }

    async fn open_namespace(&self, namespace: &str) -> BackendResult<()> {
        self.namespace(namespace);
        Ok(())
    }

    async fn namespaces(&self) -> BackendResult<Vec<SmolStr>> {
        Ok(self.namespaces.iter().map(|e| e.key().clone()).collect())
    }

    async fn delete_namespace(&self, namespace: &str) -> BackendResult<DeleteStatus> {
        Ok(match self.namespaces.remove(namespace) {
            Some((_, ns)) => DeleteStatus::Deleted(ns.len() as u32),
            None => DeleteStatus::Missing,
        })
    }

    async fn keys(&self, namespace: &str) -> BackendResult<Vec<CacheKey>> {
        Ok(self
            .namespaces
            .get(namespace)
            .map(|ns| ns.iter().map(|e| e.key().clone()).collect())
            .unwrap_or_default())
    }

    fn value_format(&self) -> &dyn Format {
        if self.binary { &BincodeFormat } else { &JsonFormat }
    }
}
