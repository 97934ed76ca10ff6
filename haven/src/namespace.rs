//! Versioned cache namespaces.
//!
//! Each [`Purpose`] has exactly one current [`CacheNamespace`]; any other
//! namespace found in the backend is stale and is deleted by
//! [`NamespaceRegistry::sweep`] during activation.

use std::fmt;

use haven_backend::{Backend, DeleteStatus};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::{debug, info, warn};

use crate::config::{NamespaceConfig, NamespaceName};
use crate::error::HavenError;

/// What a namespace holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Purpose {
    /// Precached shell and same-origin assets.
    StaticAssets,
    /// Cross-origin media.
    Media,
}

impl Purpose {
    /// Returns the purpose as a static string slice.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Purpose::StaticAssets => "static-assets",
            Purpose::Media => "media",
        }
    }
}

/// A named cache generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheNamespace {
    name: SmolStr,
    generation: SmolStr,
    purpose: Purpose,
}

impl CacheNamespace {
    /// Creates the namespace `{prefix}-{generation}`.
    pub fn new(purpose: Purpose, prefix: &str, generation: &str) -> Self {
        Self {
            name: SmolStr::from(format!("{prefix}-{generation}")),
            generation: SmolStr::new(generation),
            purpose,
        }
    }

    fn from_name(purpose: Purpose, name: &NamespaceName) -> Self {
        Self::new(purpose, &name.prefix, &name.generation)
    }

    /// Full name as stored in the backend.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Generation tag embedded in the name.
    #[inline]
    pub fn generation(&self) -> &str {
        &self.generation
    }

    /// What the namespace holds.
    #[inline]
    pub fn purpose(&self) -> Purpose {
        self.purpose
    }
}

impl fmt::Display for CacheNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Outcome of a sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Stale namespaces that were deleted.
    pub deleted: Vec<SmolStr>,
    /// Stale namespaces whose deletion failed; they are retried on the next sweep.
    pub failed: Vec<SmolStr>,
    /// Current namespaces found in the backend.
    pub kept: Vec<SmolStr>,
}

/// The current namespace of every purpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceRegistry {
    static_assets: CacheNamespace,
    media: CacheNamespace,
}

impl NamespaceRegistry {
    /// Creates a registry from the two current namespaces.
    pub fn new(static_assets: CacheNamespace, media: CacheNamespace) -> Self {
        Self {
            static_assets,
            media,
        }
    }

    /// Creates a registry from configuration.
    pub fn from_config(config: &NamespaceConfig) -> Self {
        Self::new(
            CacheNamespace::from_name(Purpose::StaticAssets, &config.static_assets),
            CacheNamespace::from_name(Purpose::Media, &config.media),
        )
    }

    /// The current namespace for `purpose`.
    pub fn current(&self, purpose: Purpose) -> &CacheNamespace {
        match purpose {
            Purpose::StaticAssets => &self.static_assets,
            Purpose::Media => &self.media,
        }
    }

    /// Whether `name` is one of the current namespaces.
    pub fn is_current(&self, name: &str) -> bool {
        self.static_assets.name() == name || self.media.name() == name
    }

    /// Deletes every namespace in `backend` that is not current.
    ///
    /// A failed deletion is logged and recorded in the report; it does not
    /// stop the remaining deletions. Only a failure to list namespaces is
    /// returned as an error.
    pub async fn sweep<B>(&self, backend: &B) -> Result<SweepReport, HavenError>
    where
        B: Backend + ?Sized,
    {
        let names = backend.namespaces().await?;
        let mut report = SweepReport::default();

        let (kept, stale): (Vec<_>, Vec<_>) =
            names.into_iter().partition(|name| self.is_current(name));
        report.kept = kept;

        let deletions = stale.into_iter().map(|name| async move {
            let result = backend.delete_namespace(&name).await;
            (name, result)
        });
        for (name, result) in futures::future::join_all(deletions).await {
            match result {
                Ok(DeleteStatus::Deleted(entries)) => {
                    info!(namespace = %name, entries, "deleted stale namespace");
                    report.deleted.push(name);
                }
                Ok(DeleteStatus::Missing) => {
                    debug!(namespace = %name, "stale namespace already gone");
                }
                Err(error) => {
                    warn!(namespace = %name, %error, "failed to delete stale namespace");
                    report.failed.push(name);
                }
            }
        }

        crate::metrics::record_sweep(report.deleted.len());
        Ok(report)
    }
}
