//! The cache agent: event dispatch and lifecycle state.

use std::fmt;
use std::sync::Arc;

use haven_backend::Backend;
use haven_core::{Network, RequestDescriptor};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::SharedNetwork;
use crate::classify::{MediaPreviewMatcher, RoutingClass, StrategySelector};
use crate::config::AgentConfig;
use crate::error::HavenError;
use crate::lifecycle::{Activated, Installed, LifecycleManager, PopulationReport};
use crate::namespace::{NamespaceRegistry, Purpose};
use crate::offload::OffloadManager;
use crate::storage::{CacheStorage, SharedBackend};
use crate::strategy::{
    AssetStrategy, FallbackPage, MediaPreviewStrategy, NavigationStrategy, Served, Strategy,
};

/// Lifecycle state of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentState {
    /// Constructed, not yet installed.
    Parsed,
    /// Precaching in progress.
    Installing,
    /// Precaching succeeded; waiting for activation.
    Installed,
    /// Sweeping stale namespaces.
    Activating,
    /// Current version.
    Activated,
    /// Installation failed; this version will never activate.
    Redundant,
}

impl AgentState {
    /// Returns the state as a static string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            AgentState::Parsed => "parsed",
            AgentState::Installing => "installing",
            AgentState::Installed => "installed",
            AgentState::Activating => "activating",
            AgentState::Activated => "activated",
            AgentState::Redundant => "redundant",
        }
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message posted to the agent.
///
/// Wire format: `{"action": "CACHE_VIDEOS", "videos": ["https://…", …]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum Message {
    /// Store every listed media URL in the media namespace.
    #[serde(rename = "CACHE_VIDEOS")]
    CacheVideos {
        /// URLs to fetch, absolute or relative to the origin.
        videos: Vec<String>,
    },
}

/// An event delivered by the host runtime.
#[derive(Debug, Clone)]
pub enum Event {
    /// Install this version.
    Install,
    /// Activate this version.
    Activate,
    /// Answer an intercepted request.
    Fetch(RequestDescriptor),
    /// Handle a posted message payload.
    Message(serde_json::Value),
}

/// Result of [`CacheAgent::handle`].
#[derive(Debug)]
pub enum EventOutcome {
    /// Install completed.
    Installed(Installed),
    /// Activation completed.
    Activated(Activated),
    /// A request was answered.
    Served(Served),
    /// Bulk media population settled.
    Populated(PopulationReport),
    /// The message carried no known action.
    Ignored,
}

/// Routes intercepted requests and reacts to lifecycle events.
///
/// Cloning is cheap; clones share storage, offloaded tasks and state.
///
/// # Example
///
/// ```ignore
/// use haven::{AgentConfig, CacheAgent};
/// use haven_moka::MokaBackend;
///
/// let agent = CacheAgent::builder()
///     .config(AgentConfig::new(origin))
///     .backend(MokaBackend::builder().build())
///     .network(network)
///     .build()?;
///
/// agent.install().await?;
/// agent.activate().await?;
/// let served = agent.fetch(&request).await?;
/// ```
#[derive(Clone)]
pub struct CacheAgent {
    inner: Arc<Inner>,
}

struct Inner {
    config: AgentConfig,
    storage: CacheStorage,
    selector: StrategySelector,
    media: MediaPreviewStrategy,
    navigation: NavigationStrategy,
    asset: AssetStrategy,
    lifecycle: LifecycleManager,
    offload: OffloadManager,
    state: watch::Sender<AgentState>,
}

impl CacheAgent {
    /// Starts building an agent.
    pub fn builder() -> CacheAgentBuilder {
        CacheAgentBuilder::default()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> AgentState {
        *self.inner.state.borrow()
    }

    /// Subscribes to lifecycle state changes.
    pub fn subscribe(&self) -> watch::Receiver<AgentState> {
        self.inner.state.subscribe()
    }

    /// The configuration the agent was built with.
    pub fn config(&self) -> &AgentConfig {
        &self.inner.config
    }

    /// Cache storage, for inspection and maintenance.
    pub fn storage(&self) -> &CacheStorage {
        &self.inner.storage
    }

    /// Background tasks spawned by navigations.
    pub fn offload(&self) -> &OffloadManager {
        &self.inner.offload
    }

    fn transition(&self, event: &'static str, from: AgentState, to: AgentState) -> Result<(), HavenError> {
        let mut current = from;
        let moved = self.inner.state.send_if_modified(|state| {
            current = *state;
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        });
        if moved {
            debug!(%from, %to, "agent state changed");
            Ok(())
        } else {
            Err(HavenError::InvalidState {
                event,
                state: current,
            })
        }
    }

    /// Installs this version: precaches the mandatory assets.
    ///
    /// Accepted only in [`AgentState::Parsed`]. On failure the agent becomes
    /// [`AgentState::Redundant`] and nothing is stored. Dropping the future
    /// before it completes returns the agent to `Parsed`.
    pub async fn install(&self) -> Result<Installed, HavenError> {
        self.transition("install", AgentState::Parsed, AgentState::Installing)?;
        let pending = PendingTransition::new(&self.inner.state, AgentState::Parsed);
        match self.inner.lifecycle.install().await {
            Ok(installed) => {
                pending.settle(AgentState::Installed);
                Ok(installed)
            }
            Err(error) => {
                warn!(%error, "install failed");
                pending.settle(AgentState::Redundant);
                Err(error)
            }
        }
    }

    /// Activates this version: deletes every stale namespace.
    ///
    /// Accepted only in [`AgentState::Installed`]. A failed or dropped
    /// activation returns the agent to `Installed`.
    pub async fn activate(&self) -> Result<Activated, HavenError> {
        self.transition("activate", AgentState::Installed, AgentState::Activating)?;
        let pending = PendingTransition::new(&self.inner.state, AgentState::Installed);
        match self.inner.lifecycle.activate().await {
            Ok(activated) => {
                pending.settle(AgentState::Activated);
                info!("agent activated");
                Ok(activated)
            }
            Err(error) => {
                warn!(%error, "activation failed");
                pending.settle(AgentState::Installed);
                Err(error)
            }
        }
    }

    /// Classifies a request.
    pub fn classify(&self, request: &RequestDescriptor) -> RoutingClass {
        self.inner.selector.classify(request)
    }

    fn strategy(&self, class: RoutingClass) -> &dyn Strategy {
        match class {
            RoutingClass::CrossOriginMediaPreview => &self.inner.media,
            RoutingClass::NavigationDocument => &self.inner.navigation,
            RoutingClass::GenericAsset => &self.inner.asset,
        }
    }

    /// Answers an intercepted request through the executor of its class.
    pub async fn fetch(&self, request: &RequestDescriptor) -> Result<Served, HavenError> {
        let class = self.classify(request);
        debug!(url = %request.url(), mode = %request.mode(), %class, "routing request");
        self.strategy(class).execute(request).await
    }

    /// Handles a posted message. Returns `None` for an unknown action.
    pub async fn message(&self, payload: &serde_json::Value) -> Option<PopulationReport> {
        match Message::deserialize(payload) {
            Ok(message) => Some(self.dispatch(message).await),
            Err(error) => {
                debug!(%error, "ignoring message");
                None
            }
        }
    }

    /// Handles a typed message.
    pub async fn dispatch(&self, message: Message) -> PopulationReport {
        match message {
            Message::CacheVideos { videos } => self.inner.lifecycle.populate_media(&videos).await,
        }
    }

    /// Handles any host event.
    pub async fn handle(&self, event: Event) -> Result<EventOutcome, HavenError> {
        Ok(match event {
            Event::Install => EventOutcome::Installed(self.install().await?),
            Event::Activate => EventOutcome::Activated(self.activate().await?),
            Event::Fetch(request) => EventOutcome::Served(self.fetch(&request).await?),
            Event::Message(payload) => match self.message(&payload).await {
                Some(report) => EventOutcome::Populated(report),
                None => EventOutcome::Ignored,
            },
        })
    }
}

/// An in-progress state (`Installing`, `Activating`) that falls back to
/// `revert` unless settled.
struct PendingTransition<'a> {
    state: &'a watch::Sender<AgentState>,
    revert: Option<AgentState>,
}

impl<'a> PendingTransition<'a> {
    fn new(state: &'a watch::Sender<AgentState>, revert: AgentState) -> Self {
        Self {
            state,
            revert: Some(revert),
        }
    }

    fn settle(mut self, to: AgentState) {
        self.revert = None;
        self.state.send_replace(to);
    }
}

impl Drop for PendingTransition<'_> {
    fn drop(&mut self) {
        if let Some(revert) = self.revert.take() {
            debug!(to = %revert, "lifecycle step abandoned, reverting state");
            self.state.send_replace(revert);
        }
    }
}

/// Builder for [`CacheAgent`].
#[derive(Default)]
pub struct CacheAgentBuilder {
    config: Option<AgentConfig>,
    backend: Option<SharedBackend>,
    network: Option<SharedNetwork>,
}

impl CacheAgentBuilder {
    /// Sets the configuration.
    pub fn config(mut self, config: AgentConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Sets the storage backend.
    pub fn backend<B>(mut self, backend: B) -> Self
    where
        B: Backend + 'static,
    {
        self.backend = Some(Arc::new(backend));
        self
    }

    /// Sets an already shared storage backend.
    pub fn shared_backend(mut self, backend: SharedBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Sets the network transport.
    pub fn network<N>(mut self, network: N) -> Self
    where
        N: Network + 'static,
    {
        self.network = Some(Arc::new(network));
        self
    }

    /// Sets an already shared network transport.
    pub fn shared_network(mut self, network: SharedNetwork) -> Self {
        self.network = Some(network);
        self
    }

    /// Builds the agent in [`AgentState::Parsed`].
    pub fn build(self) -> Result<CacheAgent, HavenError> {
        let config = self
            .config
            .ok_or_else(|| HavenError::Config("config is required".to_owned()))?;
        let backend = self
            .backend
            .ok_or_else(|| HavenError::Config("backend is required".to_owned()))?;
        let network = self
            .network
            .ok_or_else(|| HavenError::Config("network is required".to_owned()))?;

        let storage = CacheStorage::new(backend, NamespaceRegistry::from_config(&config.namespaces));
        let selector =
            StrategySelector::new(MediaPreviewMatcher::from_config(&config.media_preview)?);
        let offload = OffloadManager::new(config.offload.clone());
        let page = Arc::new(FallbackPage::new(&config.fallback_page));

        let media = MediaPreviewStrategy::new(
            storage.store(Purpose::Media),
            network.clone(),
            page.clone(),
        );
        let navigation = NavigationStrategy::new(
            storage.store(Purpose::StaticAssets),
            network.clone(),
            offload.clone(),
            config.root_url()?,
            config.navigation_fallback,
            page,
        );
        let asset = AssetStrategy::new(storage.store(Purpose::StaticAssets), network.clone());
        let lifecycle = LifecycleManager::new(storage.clone(), network, &config)?;

        let (state, _) = watch::channel(AgentState::Parsed);
        Ok(CacheAgent {
            inner: Arc::new(Inner {
                config,
                storage,
                selector,
                media,
                navigation,
                asset,
                lifecycle,
                offload,
                state,
            }),
        })
    }
}
