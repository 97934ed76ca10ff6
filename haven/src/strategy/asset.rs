use async_trait::async_trait;
use haven_core::{FetchOptions, RequestDescriptor};
use tracing::{debug, warn};

use super::{Served, Strategy};
use crate::SharedNetwork;
use crate::classify::RoutingClass;
use crate::error::HavenError;
use crate::metrics;
use crate::storage::Store;

/// Cache-first executor for everything that is neither a navigation nor a
/// media preview.
///
/// Only a `200`, same-origin, non-redirected response is stored; anything
/// else is returned uncached. A network failure on a miss is returned as an
/// error.
#[derive(Clone)]
pub struct AssetStrategy {
    store: Store,
    network: SharedNetwork,
}

impl AssetStrategy {
    /// Creates the executor over the static-assets store.
    pub fn new(store: Store, network: SharedNetwork) -> Self {
        Self { store, network }
    }
}

#[async_trait]
impl Strategy for AssetStrategy {
    fn class(&self) -> RoutingClass {
        RoutingClass::GenericAsset
    }

    async fn execute(&self, request: &RequestDescriptor) -> Result<Served, HavenError> {
        let namespace = self.store.namespace().name();
        match self.store.match_request(request).await {
            Ok(Some(entry)) => {
                debug!(url = %request.url(), namespace, "asset served from cache");
                metrics::record_hit(self.class());
                return Ok(Served::cache(namespace, entry.into_response()));
            }
            Ok(None) => metrics::record_miss(self.class()),
            Err(error) => {
                warn!(url = %request.url(), %error, "asset cache lookup failed");
                metrics::record_miss(self.class());
            }
        }

        let response = self
            .network
            .fetch(request, FetchOptions::for_request(request))
            .await?;

        if !response.is_plain_same_origin_ok() || !request.is_get() {
            debug!(url = %request.url(), status = ?response.status(), "asset not cacheable");
            return Ok(Served::network(response));
        }

        if let Err(error) = self.store.put(request, response.clone()).await {
            warn!(url = %request.url(), %error, "failed to store asset");
        }
        Ok(Served::network(response))
    }
}
