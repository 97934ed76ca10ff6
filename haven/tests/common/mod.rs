//! Shared fixtures: a scripted network and a backend with injectable failures.
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use haven::{
    AgentConfig, CacheAgent, FetchOptions, Network, NetworkError, Payload, RequestDescriptor,
    Response,
};
use haven_backend::{Backend, BackendError, BackendResult, DeleteStatus};
use haven_core::{CacheKey, Raw};
use haven_moka::MokaBackend;
use http::StatusCode;
use smol_str::SmolStr;
use url::Url;

pub const ORIGIN: &str = "https://app.example/";

pub fn origin() -> Url {
    Url::parse(ORIGIN).unwrap()
}

pub fn url(path: &str) -> Url {
    origin().join(path).unwrap()
}

pub fn html(body: &'static str) -> Response {
    Response::html(body)
}

/// Network answering from a script.
///
/// Unscripted URLs answer `404`. URLs marked failing, or every URL while
/// offline, produce [`NetworkError::Unreachable`].
#[derive(Clone, Default)]
pub struct MockNetwork {
    routes: Arc<DashMap<String, Response>>,
    failing: Arc<DashSet<String>>,
    offline: Arc<AtomicBool>,
    stalled: Arc<AtomicBool>,
    calls: Arc<DashMap<String, usize>>,
    options: Arc<DashMap<String, FetchOptions>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the response for `url`.
    pub fn route(&self, url: &Url, response: Response) -> &Self {
        self.routes.insert(url.to_string(), response);
        self
    }

    /// Makes `url` unreachable.
    pub fn fail(&self, url: &Url) -> &Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// While stalled, fetches never complete.
    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }

    /// Number of fetches of `url`.
    pub fn calls(&self, url: &Url) -> usize {
        self.calls.get(url.as_str()).map(|c| *c).unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|c| *c.value()).sum()
    }

    /// Options of the last fetch of `url`.
    pub fn last_options(&self, url: &Url) -> Option<FetchOptions> {
        self.options.get(url.as_str()).map(|o| *o)
    }

    /// Scripts a `200` HTML response for every default precache path.
    pub fn serve_app_shell(&self) -> &Self {
        for url in AgentConfig::new(origin()).precache_urls().unwrap() {
            let body = format!("shell {}", url.path());
            self.route(&url, Response::html(body));
        }
        self
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(
        &self,
        request: &RequestDescriptor,
        options: FetchOptions,
    ) -> Result<Response, NetworkError> {
        let url = request.url().to_string();
        *self.calls.entry(url.clone()).or_insert(0) += 1;
        self.options.insert(url.clone(), options);

        if self.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }

        if self.offline.load(Ordering::SeqCst) || self.failing.contains(&url) {
            return Err(NetworkError::Unreachable(format!("{url} is unreachable")));
        }
        Ok(self
            .routes
            .get(&url)
            .map(|r| r.clone())
            .unwrap_or_else(|| Payload::new(StatusCode::NOT_FOUND, "not found").into()))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("injected failure")]
pub struct InjectedFailure;

/// Moka backend whose namespace deletions fail for chosen names and whose
/// namespace listing can be stalled.
#[derive(Clone)]
pub struct FlakyBackend {
    inner: MokaBackend,
    undeletable: Arc<DashSet<String>>,
    listing_stalled: Arc<AtomicBool>,
}

impl FlakyBackend {
    pub fn new(inner: MokaBackend) -> Self {
        Self {
            inner,
            undeletable: Arc::new(DashSet::new()),
            listing_stalled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// While stalled, listing namespaces never completes.
    pub fn stall_listing(&self, stalled: bool) {
        self.listing_stalled.store(stalled, Ordering::SeqCst);
    }

    pub fn refuse_delete(&self, namespace: &str) {
        self.undeletable.insert(namespace.to_owned());
    }
}

#[async_trait]
impl Backend for FlakyBackend {
    async fn read(&self, namespace: &str, key: &CacheKey) -> BackendResult<Option<Raw>> {
        self.inner.read(namespace, key).await
    }

    async fn write(&self, namespace: &str, key: &CacheKey, value: Raw) -> BackendResult<()> {
        self.inner.write(namespace, key, value).await
    }

    async fn remove(&self, namespace: &str, key: &CacheKey) -> BackendResult<DeleteStatus> {
        self.inner.remove(namespace, key).await
    }

    async fn open_namespace(&self, namespace: &str) -> BackendResult<()> {
        self.inner.open_namespace(namespace).await
    }

    async fn namespaces(&self) -> BackendResult<Vec<SmolStr>> {
        if self.listing_stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        self.inner.namespaces().await
    }

    async fn delete_namespace(&self, namespace: &str) -> BackendResult<DeleteStatus> {
        if self.undeletable.contains(namespace) {
            return Err(BackendError::internal(InjectedFailure));
        }
        self.inner.delete_namespace(namespace).await
    }

    async fn keys(&self, namespace: &str) -> BackendResult<Vec<CacheKey>> {
        self.inner.keys(namespace).await
    }
}

pub fn agent_with(config: AgentConfig, backend: MokaBackend, network: &MockNetwork) -> CacheAgent {
    CacheAgent::builder()
        .config(config)
        .backend(backend)
        .network(network.clone())
        .build()
        .unwrap()
}

pub fn agent(backend: MokaBackend, network: &MockNetwork) -> CacheAgent {
    agent_with(AgentConfig::new(origin()), backend, network)
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
