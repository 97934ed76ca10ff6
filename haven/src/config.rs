//! Agent configuration.
//!
//! Every identifier the agent depends on (namespace names, the precache
//! list, the media preview pattern) is configuration handed to the
//! components at construction. An [`AgentConfig`] is built in code with
//! [`AgentConfig::builder`] or loaded from YAML:
//!
//! ```
//! use haven::config::{AgentConfig, NavigationFallback};
//!
//! let config = AgentConfig::from_yaml(r#"
//! origin: https://app.example/
//! namespaces:
//!   static_assets:
//!     generation: v2
//! navigation_fallback: OfflinePage
//! "#).unwrap();
//!
//! assert_eq!(config.namespaces.static_assets.name(), "static-assets-v2");
//! assert_eq!(config.namespaces.media.name(), "media-v1");
//! assert_eq!(config.navigation_fallback, NavigationFallback::OfflinePage);
//! ```

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::HavenError;
use crate::offload::OffloadConfig;

const DEFAULT_ROOT_DOCUMENT: &str = "/MagicTraining/";

/// Complete configuration of a [`CacheAgent`](crate::CacheAgent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Application origin. Relative paths resolve against it, and it decides
    /// which responses count as same-origin.
    pub origin: Url,
    /// Document served when a navigation fails and the exact page is not cached.
    #[serde(default = "default_root_document")]
    pub root_document: String,
    /// Mandatory assets fetched at install. Any failure fails installation.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,
    /// Current namespace generations.
    #[serde(default)]
    pub namespaces: NamespaceConfig,
    /// Which URLs are cross-origin media previews.
    #[serde(default)]
    pub media_preview: MediaPreviewConfig,
    /// Content of the synthesized unavailability document.
    #[serde(default)]
    pub fallback_page: FallbackPageConfig,
    /// Outcome of a navigation with neither network nor cached document.
    #[serde(default)]
    pub navigation_fallback: NavigationFallback,
    /// Background write-back policy.
    #[serde(default)]
    pub offload: OffloadConfig,
}

fn default_root_document() -> String {
    DEFAULT_ROOT_DOCUMENT.to_owned()
}

fn default_precache() -> Vec<String> {
    [
        "",
        "index.html",
        "manifest.json",
        "icons/icon-152.png",
        "icons/icon-192.png",
        "icons/icon-512.png",
    ]
    .iter()
    .map(|path| format!("{DEFAULT_ROOT_DOCUMENT}{path}"))
    .collect()
}

impl AgentConfig {
    /// Default configuration for `origin`.
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            root_document: default_root_document(),
            precache: default_precache(),
            namespaces: NamespaceConfig::default(),
            media_preview: MediaPreviewConfig::default(),
            fallback_page: FallbackPageConfig::default(),
            navigation_fallback: NavigationFallback::default(),
            offload: OffloadConfig::default(),
        }
    }

    /// Starts a builder with default values for `origin`.
    pub fn builder(origin: Url) -> AgentConfigBuilder {
        AgentConfigBuilder {
            config: Self::new(origin),
        }
    }

    /// Parses a YAML document.
    pub fn from_yaml(source: &str) -> Result<Self, HavenError> {
        serde_saphyr::from_str(source).map_err(|e| HavenError::Config(e.to_string()))
    }

    /// Resolves a path or absolute URL against the origin.
    pub fn resolve(&self, input: &str) -> Result<Url, HavenError> {
        self.origin
            .join(input)
            .map_err(|source| HavenError::InvalidUrl {
                input: input.to_owned(),
                source,
            })
    }

    /// Absolute URL of the root document.
    pub fn root_url(&self) -> Result<Url, HavenError> {
        self.resolve(&self.root_document)
    }

    /// Absolute URLs of the precache list, in order.
    pub fn precache_urls(&self) -> Result<Vec<Url>, HavenError> {
        self.precache.iter().map(|path| self.resolve(path)).collect()
    }
}

/// Name of one namespace: `{prefix}-{generation}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceName {
    /// Purpose prefix.
    pub prefix: String,
    /// Generation tag; bumping it invalidates the previous namespace on activation.
    pub generation: String,
}

impl NamespaceName {
    /// Creates a namespace name.
    pub fn new(prefix: impl Into<String>, generation: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            generation: generation.into(),
        }
    }

    /// Full namespace name.
    pub fn name(&self) -> String {
        format!("{}-{}", self.prefix, self.generation)
    }
}

#[derive(Deserialize)]
struct PartialNamespaceName {
    prefix: Option<String>,
    generation: Option<String>,
}

fn fill(partial: Option<PartialNamespaceName>, default: NamespaceName) -> NamespaceName {
    match partial {
        Some(partial) => NamespaceName {
            prefix: partial.prefix.unwrap_or(default.prefix),
            generation: partial.generation.unwrap_or(default.generation),
        },
        None => default,
    }
}

/// Current namespace for each purpose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamespaceConfig {
    /// Namespace for precached and same-origin assets.
    pub static_assets: NamespaceName,
    /// Namespace for cross-origin media.
    pub media: NamespaceName,
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            static_assets: NamespaceName::new("static-assets", "v1"),
            media: NamespaceName::new("media", "v1"),
        }
    }
}

// Either field of either namespace may be omitted; missing parts keep
// their defaults.
impl<'de> Deserialize<'de> for NamespaceConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Partial {
            static_assets: Option<PartialNamespaceName>,
            media: Option<PartialNamespaceName>,
        }

        let partial = Partial::deserialize(deserializer)?;
        let defaults = NamespaceConfig::default();
        Ok(Self {
            static_assets: fill(partial.static_assets, defaults.static_assets),
            media: fill(partial.media, defaults.media),
        })
    }
}

/// Cross-origin media preview pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediaPreviewConfig {
    /// External file-preview hosts, matched case-insensitively.
    pub hosts: Vec<String>,
    /// Regular expression the URL path must match.
    pub path_pattern: String,
}

impl Default for MediaPreviewConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["drive.google.com".to_owned()],
            path_pattern: "^/file/d/[^/]+/preview".to_owned(),
        }
    }
}

/// Text of the synthesized unavailability document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackPageConfig {
    /// Document title.
    pub title: String,
    /// Main heading.
    pub heading: String,
    /// Paragraphs under the heading.
    pub lines: Vec<String>,
}

impl Default for FallbackPageConfig {
    fn default() -> Self {
        Self {
            title: "Video unavailable".to_owned(),
            heading: "Video temporarily unavailable".to_owned(),
            lines: vec![
                "Check your internet connection".to_owned(),
                "or open the video directly in Google Drive".to_owned(),
            ],
        }
    }
}

/// What a navigation returns when the network and the cache both fail.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavigationFallback {
    /// Surface [`HavenError::NavigationUnavailable`] to the host.
    #[default]
    Fail,
    /// Serve the synthesized unavailability document.
    OfflinePage,
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone)]
pub struct AgentConfigBuilder {
    config: AgentConfig,
}

impl AgentConfigBuilder {
    /// Sets the root document path.
    pub fn root_document(mut self, path: impl Into<String>) -> Self {
        self.config.root_document = path.into();
        self
    }

    /// Replaces the precache list.
    pub fn precache<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.precache = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the static-assets generation.
    pub fn static_generation(mut self, generation: impl Into<String>) -> Self {
        self.config.namespaces.static_assets.generation = generation.into();
        self
    }

    /// Sets the media generation.
    pub fn media_generation(mut self, generation: impl Into<String>) -> Self {
        self.config.namespaces.media.generation = generation.into();
        self
    }

    /// Replaces both namespace names.
    pub fn namespaces(mut self, namespaces: NamespaceConfig) -> Self {
        self.config.namespaces = namespaces;
        self
    }

    /// Sets the media preview pattern.
    pub fn media_preview(mut self, media_preview: MediaPreviewConfig) -> Self {
        self.config.media_preview = media_preview;
        self
    }

    /// Sets the unavailability document text.
    pub fn fallback_page(mut self, fallback_page: FallbackPageConfig) -> Self {
        self.config.fallback_page = fallback_page;
        self
    }

    /// Sets the navigation fallback.
    pub fn navigation_fallback(mut self, fallback: NavigationFallback) -> Self {
        self.config.navigation_fallback = fallback;
        self
    }

    /// Sets the background write-back policy.
    pub fn offload(mut self, offload: OffloadConfig) -> Self {
        self.config.offload = offload;
        self
    }

    /// Finishes the configuration.
    pub fn build(self) -> AgentConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::offload::TimeoutPolicy;

    fn origin() -> Url {
        Url::parse("https://app.example/").unwrap()
    }

    #[test]
    fn test_default_precache_list() {
        let config = AgentConfig::new(origin());
        let urls: Vec<String> = config
            .precache_urls()
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();

        assert_eq!(
            urls,
            vec![
                "https://app.example/MagicTraining/",
                "https://app.example/MagicTraining/index.html",
                "https://app.example/MagicTraining/manifest.json",
                "https://app.example/MagicTraining/icons/icon-152.png",
                "https://app.example/MagicTraining/icons/icon-192.png",
                "https://app.example/MagicTraining/icons/icon-512.png",
            ]
        );
    }

    #[test]
    fn test_minimal_yaml_uses_defaults() {
        let config = AgentConfig::from_yaml("origin: https://app.example/\n").unwrap();
        assert_eq!(config, AgentConfig::new(origin()));
    }

    #[test]
    fn test_full_yaml() {
        let yaml = r#"
origin: https://app.example/
root_document: /app/
precache:
  - /app/
  - /app/app.js
namespaces:
  static_assets:
    prefix: shell
    generation: v3
  media:
    generation: v2
media_preview:
  hosts: [videos.example]
  path_pattern: "^/embed/"
fallback_page:
  title: Offline
  heading: You are offline
  lines: []
navigation_fallback: OfflinePage
offload:
  deduplicate: true
  timeout:
    Cancel: 30s
"#;
        let config = AgentConfig::from_yaml(yaml).unwrap();

        assert_eq!(config.root_url().unwrap().as_str(), "https://app.example/app/");
        assert_eq!(config.precache, vec!["/app/", "/app/app.js"]);
        assert_eq!(config.namespaces.static_assets.name(), "shell-v3");
        assert_eq!(config.namespaces.media.name(), "media-v2");
        assert_eq!(config.media_preview.hosts, vec!["videos.example"]);
        assert_eq!(config.fallback_page.title, "Offline");
        assert_eq!(config.navigation_fallback, NavigationFallback::OfflinePage);
        assert_eq!(
            config.offload,
            OffloadConfig {
                timeout: TimeoutPolicy::Cancel(Duration::from_secs(30)),
                deduplicate: true,
            }
        );
    }

    #[test]
    fn test_missing_origin_is_config_error() {
        let result = AgentConfig::from_yaml("root_document: /app/\n");
        assert!(matches!(result, Err(HavenError::Config(_))));
    }

    #[test]
    fn test_builder() {
        let config = AgentConfig::builder(origin())
            .static_generation("v2")
            .media_generation("v7")
            .precache(["/MagicTraining/"])
            .navigation_fallback(NavigationFallback::OfflinePage)
            .build();

        assert_eq!(config.namespaces.static_assets.name(), "static-assets-v2");
        assert_eq!(config.namespaces.media.name(), "media-v7");
        assert_eq!(config.precache.len(), 1);
    }

    #[test]
    fn test_absolute_precache_entry_is_kept() {
        let config = AgentConfig::builder(origin())
            .precache(["https://cdn.example/lib.js"])
            .build();
        assert_eq!(
            config.precache_urls().unwrap()[0].as_str(),
            "https://cdn.example/lib.js"
        );
    }
}
