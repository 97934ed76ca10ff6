//! Strategy executors, one per [`RoutingClass`].
//!
//! | class | executor | order |
//! |-------|----------|-------|
//! | `CrossOriginMediaPreview` | [`MediaPreviewStrategy`] | media cache, then `no-cors` network, then fallback page |
//! | `NavigationDocument` | [`NavigationStrategy`] | network (write-back offloaded), then cached page, then root document |
//! | `GenericAsset` | [`AssetStrategy`] | static-assets cache, then network |

use async_trait::async_trait;
use haven_core::{RequestDescriptor, Response};
use smol_str::SmolStr;

use crate::classify::RoutingClass;
use crate::error::HavenError;

mod asset;
mod fallback;
mod media;
mod navigation;

pub use asset::AssetStrategy;
pub use fallback::FallbackPage;
pub use media::MediaPreviewStrategy;
pub use navigation::NavigationStrategy;

/// Where a served response came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseSource {
    /// Read from the named namespace.
    Cache(SmolStr),
    /// Fetched from the network.
    Network,
    /// Synthesized by the agent.
    Fallback,
}

impl ResponseSource {
    /// Returns the source as a string slice.
    pub fn as_str(&self) -> &str {
        match self {
            ResponseSource::Cache(namespace) => namespace,
            ResponseSource::Network => "network",
            ResponseSource::Fallback => "fallback",
        }
    }
}

/// A response together with its source.
#[derive(Debug, Clone, PartialEq)]
pub struct Served {
    /// The response handed back to the host.
    pub response: Response,
    /// Where it came from.
    pub source: ResponseSource,
}

impl Served {
    pub(crate) fn cache(namespace: &str, response: Response) -> Self {
        Self {
            response,
            source: ResponseSource::Cache(SmolStr::new(namespace)),
        }
    }

    pub(crate) fn network(response: Response) -> Self {
        Self {
            response,
            source: ResponseSource::Network,
        }
    }

    pub(crate) fn fallback(response: Response) -> Self {
        Self {
            response,
            source: ResponseSource::Fallback,
        }
    }

    /// Whether the response was read from a namespace.
    pub fn is_cached(&self) -> bool {
        matches!(self.source, ResponseSource::Cache(_))
    }

    /// Drops the source, returning the response.
    pub fn into_response(self) -> Response {
        self.response
    }
}

/// Executes the fetch/cache/fallback sequence of one routing class.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// The class this strategy answers.
    fn class(&self) -> RoutingClass;

    /// Answers `request`.
    async fn execute(&self, request: &RequestDescriptor) -> Result<Served, HavenError>;
}
