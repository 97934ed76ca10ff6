use std::sync::Arc;

use async_trait::async_trait;
use haven_core::{Credentials, FetchOptions, RequestDescriptor};
use tracing::{debug, warn};

use super::{FallbackPage, Served, Strategy};
use crate::SharedNetwork;
use crate::classify::RoutingClass;
use crate::error::HavenError;
use crate::metrics;
use crate::storage::Store;

/// Cache-first executor for cross-origin media previews.
///
/// A cached entry is returned as is, without revalidation. On a miss the
/// preview is fetched in `no-cors` mode without credentials and stored
/// whatever its type, opaque included. When the network is unreachable the
/// fallback page is served, so this executor never returns an error.
#[derive(Clone)]
pub struct MediaPreviewStrategy {
    store: Store,
    network: SharedNetwork,
    page: Arc<FallbackPage>,
}

impl MediaPreviewStrategy {
    /// Creates the executor over the media store.
    pub fn new(store: Store, network: SharedNetwork, page: Arc<FallbackPage>) -> Self {
        Self {
            store,
            network,
            page,
        }
    }
}

#[async_trait]
impl Strategy for MediaPreviewStrategy {
    fn class(&self) -> RoutingClass {
        RoutingClass::CrossOriginMediaPreview
    }

    async fn execute(&self, request: &RequestDescriptor) -> Result<Served, HavenError> {
        let namespace = self.store.namespace().name();
        match self.store.match_request(request).await {
            Ok(Some(entry)) => {
                debug!(url = %request.url(), namespace, "media served from cache");
                metrics::record_hit(self.class());
                return Ok(Served::cache(namespace, entry.into_response()));
            }
            Ok(None) => metrics::record_miss(self.class()),
            Err(error) => {
                warn!(url = %request.url(), %error, "media cache lookup failed");
                metrics::record_miss(self.class());
            }
        }

        let options = FetchOptions::no_cors().credentials(Credentials::Omit);
        let response = match self.network.fetch(request, options).await {
            Ok(response) => response,
            Err(error) => {
                debug!(url = %request.url(), %error, "media unavailable, serving fallback page");
                metrics::record_fallback(self.class());
                return Ok(Served::fallback(self.page.response()));
            }
        };

        if let Err(error) = self.store.put(request, response.clone()).await {
            warn!(url = %request.url(), %error, "failed to store media");
        }
        Ok(Served::network(response))
    }
}
