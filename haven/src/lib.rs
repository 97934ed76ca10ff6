//! Offline request caching agent.
//!
//! `haven` decides, for every intercepted request of a web application,
//! whether to answer from a local cache, from the network, or with a
//! degraded response. It manages versioned cache namespaces across
//! install and activation, and fills the media namespace in bulk on request.
//!
//! The agent does not own a transport or a store: it is handed a
//! [`Network`](haven_core::Network) (see `haven-reqwest`) and a
//! [`Backend`](haven_backend::Backend) (see `haven-moka` and `haven-feoxdb`).
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

use std::sync::Arc;

/// The agent and its events.
pub mod agent;

/// Request classification into routing classes.
pub mod classify;

/// Agent configuration, buildable in code or loaded from YAML.
pub mod config;

/// Error types for agent operations.
pub mod error;

/// Install, activate and bulk population.
pub mod lifecycle;

/// Metrics collection.
///
/// When the `metrics` feature is enabled, counters are recorded for cache
/// hits, misses and fallbacks per routing class, bulk population results,
/// swept namespaces and offloaded tasks.
pub mod metrics;

/// Versioned namespaces and the stale-namespace sweep.
pub mod namespace;

/// Background task offloading for navigation write-back.
pub mod offload;

/// Store adapter enforcing the storage rules.
pub mod storage;

/// Strategy executors.
pub mod strategy;

pub use agent::{AgentState, CacheAgent, CacheAgentBuilder, Event, EventOutcome, Message};
pub use classify::{MediaPreviewMatcher, RoutingClass, StrategySelector};
pub use config::{AgentConfig, NavigationFallback};
pub use error::HavenError;
pub use lifecycle::{Activated, Installed, LifecycleManager, PopulationReport};
pub use namespace::{CacheNamespace, NamespaceRegistry, Purpose, SweepReport};
pub use storage::{CacheStorage, SharedBackend, Store};
pub use strategy::{ResponseSource, Served};

pub use haven_core::{
    CacheEntry, CacheKey, Credentials, FetchOptions, Network, NetworkError, Opaque, Payload,
    RequestDescriptor, RequestMode, Response, ResponseType,
};

/// Network transport shared by every executor of an agent.
pub type SharedNetwork = Arc<dyn haven_core::Network>;
