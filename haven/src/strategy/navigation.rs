use std::sync::Arc;

use async_trait::async_trait;
use haven_core::{CacheKey, FetchOptions, RequestDescriptor};
use tracing::{debug, warn};
use url::Url;

use super::{FallbackPage, Served, Strategy};
use crate::SharedNetwork;
use crate::classify::RoutingClass;
use crate::config::NavigationFallback;
use crate::error::HavenError;
use crate::metrics;
use crate::offload::{OffloadKey, OffloadManager};
use crate::storage::Store;

/// Network-first executor for document navigations.
///
/// A fetched document is returned immediately; its copy is written to the
/// static-assets store on an offloaded task. When the fetch fails the
/// cached copy of the page is served, then the cached root document, then
/// whatever [`NavigationFallback`] says.
#[derive(Clone)]
pub struct NavigationStrategy {
    store: Store,
    network: SharedNetwork,
    offload: OffloadManager,
    root: Url,
    fallback: NavigationFallback,
    page: Arc<FallbackPage>,
}

impl NavigationStrategy {
    /// Creates the executor over the static-assets store.
    pub fn new(
        store: Store,
        network: SharedNetwork,
        offload: OffloadManager,
        root: Url,
        fallback: NavigationFallback,
        page: Arc<FallbackPage>,
    ) -> Self {
        Self {
            store,
            network,
            offload,
            root,
            fallback,
            page,
        }
    }

    async fn cached(&self, request: &RequestDescriptor) -> Option<Served> {
        let namespace = self.store.namespace().name();

        match self.store.match_request(request).await {
            Ok(Some(entry)) => return Some(Served::cache(namespace, entry.into_response())),
            Ok(None) => {}
            Err(error) => warn!(url = %request.url(), %error, "document cache lookup failed"),
        }

        match self.store.match_url(&self.root).await {
            Ok(Some(entry)) => {
                debug!(url = %request.url(), root = %self.root, "serving cached root document");
                Some(Served::cache(namespace, entry.into_response()))
            }
            Ok(None) => None,
            Err(error) => {
                warn!(root = %self.root, %error, "root document cache lookup failed");
                None
            }
        }
    }
}

#[async_trait]
impl Strategy for NavigationStrategy {
    fn class(&self) -> RoutingClass {
        RoutingClass::NavigationDocument
    }

    async fn execute(&self, request: &RequestDescriptor) -> Result<Served, HavenError> {
        match self
            .network
            .fetch(request, FetchOptions::for_request(request))
            .await
        {
            Ok(response) => {
                if request.is_get() {
                    let store = self.store.clone();
                    let request = request.clone();
                    let copy = response.clone();
                    let key = OffloadKey::write(
                        store.namespace().name(),
                        CacheKey::for_request(&request),
                    );
                    self.offload.spawn_with_key(key, async move {
                        if let Err(error) = store.put(&request, copy).await {
                            warn!(url = %request.url(), %error, "document write-back failed");
                        }
                    });
                }
                Ok(Served::network(response))
            }
            Err(error) => {
                debug!(url = %request.url(), %error, "navigation fetch failed, trying cache");
                if let Some(served) = self.cached(request).await {
                    metrics::record_hit(self.class());
                    return Ok(served);
                }
                metrics::record_miss(self.class());
                match self.fallback {
                    NavigationFallback::Fail => Err(HavenError::NavigationUnavailable {
                        url: request.url().clone(),
                    }),
                    NavigationFallback::OfflinePage => {
                        metrics::record_fallback(self.class());
                        Ok(Served::fallback(self.page.response()))
                    }
                }
            }
        }
    }
}
