//! Install, activate and bulk media population.

use futures::future::join_all;
use haven_core::{FetchOptions, RequestDescriptor, RequestMode};
use tracing::{info, warn};
use url::Url;

use crate::SharedNetwork;
use crate::config::AgentConfig;
use crate::error::HavenError;
use crate::namespace::{Purpose, SweepReport};
use crate::storage::CacheStorage;

/// Completion signal of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installed {
    /// Number of precached assets.
    pub precached: usize,
    /// The new version should take over immediately instead of waiting for
    /// the previous one to be released.
    pub skip_waiting: bool,
}

/// Completion signal of an activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activated {
    /// What the namespace sweep did.
    pub sweep: SweepReport,
    /// The agent should take control of every open context.
    pub claim_clients: bool,
}

/// Outcome of a bulk media population.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationReport {
    /// URLs fetched and stored.
    pub stored: usize,
    /// URLs that could not be parsed, fetched or stored.
    pub failed: usize,
}

/// Owns namespace creation and deletion decisions.
#[derive(Clone)]
pub struct LifecycleManager {
    storage: CacheStorage,
    network: SharedNetwork,
    origin: Url,
    precache: Vec<Url>,
}

impl LifecycleManager {
    /// Creates the manager, resolving the precache list against the origin.
    pub fn new(
        storage: CacheStorage,
        network: SharedNetwork,
        config: &AgentConfig,
    ) -> Result<Self, HavenError> {
        Ok(Self {
            storage,
            network,
            origin: config.origin.clone(),
            precache: config.precache_urls()?,
        })
    }

    /// Precaches every mandatory asset into static-assets.
    ///
    /// Fails as a whole if any asset fails; in that case nothing is stored.
    pub async fn install(&self) -> Result<Installed, HavenError> {
        let store = self.storage.open(Purpose::StaticAssets).await?;
        info!(namespace = %store.namespace(), assets = self.precache.len(), "precaching");
        let precached = store.add_all(self.network.as_ref(), &self.precache).await?;
        info!(namespace = %store.namespace(), precached, "install complete");
        Ok(Installed {
            precached,
            skip_waiting: true,
        })
    }

    /// Deletes every stale namespace.
    pub async fn activate(&self) -> Result<Activated, HavenError> {
        let sweep = self
            .storage
            .registry()
            .sweep(self.storage.backend().as_ref())
            .await?;
        info!(
            deleted = sweep.deleted.len(),
            failed = sweep.failed.len(),
            "activation complete"
        );
        Ok(Activated {
            sweep,
            claim_clients: true,
        })
    }

    /// Fetches and stores every URL into the media namespace.
    ///
    /// Each URL is handled independently and concurrently; a failure is
    /// logged and counted, never propagated. Returns once every attempt has
    /// settled.
    pub async fn populate_media<S>(&self, urls: &[S]) -> PopulationReport
    where
        S: AsRef<str>,
    {
        info!(count = urls.len(), "populating media");
        let store = self.storage.store(Purpose::Media);

        let attempts = urls.iter().map(|input| {
            let store = store.clone();
            async move {
                let input = input.as_ref();
                let url = self.origin.join(input).map_err(|source| HavenError::InvalidUrl {
                    input: input.to_owned(),
                    source,
                })?;
                let request = RequestDescriptor::new(url).with_mode(RequestMode::NoCors);
                let response = self
                    .network
                    .fetch(&request, FetchOptions::no_cors())
                    .await?;
                store.put(&request, response).await
            }
        });

        let mut report = PopulationReport::default();
        for (input, result) in urls.iter().zip(join_all(attempts).await) {
            match result {
                Ok(()) => report.stored += 1,
                Err(error) => {
                    warn!(url = input.as_ref(), %error, "failed to cache media");
                    report.failed += 1;
                }
            }
        }

        crate::metrics::record_population(report.stored, report.failed);
        info!(stored = report.stored, failed = report.failed, "media population settled");
        report
    }
}
