//! Request classification.
//!
//! Every intercepted request maps to exactly one [`RoutingClass`]; the class
//! picks the executor that answers it.

use std::fmt;

use haven_core::{RequestDescriptor, RequestMode};
use regex::Regex;
use url::Url;

use crate::config::MediaPreviewConfig;
use crate::error::HavenError;

/// Routing class of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoutingClass {
    /// Preview of a file on an external file-preview host.
    CrossOriginMediaPreview,
    /// Top-level document navigation.
    NavigationDocument,
    /// Everything else.
    GenericAsset,
}

impl RoutingClass {
    /// Returns the class as a static string slice, used in logs and metrics.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RoutingClass::CrossOriginMediaPreview => "media-preview",
            RoutingClass::NavigationDocument => "navigation",
            RoutingClass::GenericAsset => "asset",
        }
    }
}

impl fmt::Display for RoutingClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Matches URLs of the cross-origin media preview pattern.
#[derive(Debug, Clone)]
pub struct MediaPreviewMatcher {
    hosts: Vec<String>,
    path: Regex,
}

impl MediaPreviewMatcher {
    /// Creates a matcher from hosts and a path regular expression.
    pub fn new<I, S>(hosts: I, path_pattern: &str) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(Self {
            hosts: hosts
                .into_iter()
                .map(|host| host.into().to_ascii_lowercase())
                .collect(),
            path: Regex::new(path_pattern)?,
        })
    }

    /// Creates a matcher from configuration.
    pub fn from_config(config: &MediaPreviewConfig) -> Result<Self, HavenError> {
        Self::new(config.hosts.iter().cloned(), &config.path_pattern)
            .map_err(|e| HavenError::Config(format!("media_preview.path_pattern: {e}")))
    }

    /// Whether `url` is on a preview host and its path is a preview sub-resource.
    pub fn matches(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        self.hosts.iter().any(|h| h.eq_ignore_ascii_case(host)) && self.path.is_match(url.path())
    }
}

/// Picks the routing class of each request.
#[derive(Debug, Clone)]
pub struct StrategySelector {
    media: MediaPreviewMatcher,
}

impl StrategySelector {
    /// Creates a selector.
    pub fn new(media: MediaPreviewMatcher) -> Self {
        Self { media }
    }

    /// Classifies `request`, in priority order: media preview pattern,
    /// navigation mode, everything else.
    pub fn classify(&self, request: &RequestDescriptor) -> RoutingClass {
        if self.media.matches(request.url()) {
            RoutingClass::CrossOriginMediaPreview
        } else if request.mode() == RequestMode::Navigate {
            RoutingClass::NavigationDocument
        } else {
            RoutingClass::GenericAsset
        }
    }
}
