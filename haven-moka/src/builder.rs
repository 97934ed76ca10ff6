//! Builder for configuring [`MokaBackend`].

use std::sync::Arc;

use dashmap::DashMap;
use haven_backend::format::{Format, JsonFormat};
use haven_core::{BackendLabel, CacheKey, Raw};
use moka::future::Cache;
use moka::policy::EvictionPolicy;

use crate::backend::MokaBackend;

/// Per-namespace capacity limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    /// At most `n` entries per namespace.
    Entries(u64),
    /// At most `n` bytes (approximate) per namespace.
    Bytes(u64),
}

impl Default for Capacity {
    fn default() -> Self {
        Capacity::Entries(10_000)
    }
}

/// Builder for creating and configuring a [`MokaBackend`].
///
/// # Examples
///
/// ```
/// use haven_moka::MokaBackend;
/// use haven_backend::format::BincodeFormat;
///
/// // 256 MB per namespace, compact values
/// let backend = MokaBackend::builder()
///     .max_bytes(256 * 1024 * 1024)
///     .value_format(BincodeFormat)
///     .build();
/// ```
#[derive(Clone)]
pub struct MokaBackendBuilder<S = JsonFormat>
where
    S: Format,
{
    capacity: Capacity,
    serializer: S,
    label: BackendLabel,
    eviction_policy: Option<EvictionPolicy>,
}

impl Default for MokaBackendBuilder<JsonFormat> {
    fn default() -> Self {
        Self {
            capacity: Capacity::default(),
            serializer: JsonFormat,
            label: BackendLabel::new_static("moka"),
            eviction_policy: None,
        }
    }
}

impl<S> MokaBackendBuilder<S>
where
    S: Format,
{
    /// Limits each namespace to `entries` entries.
    pub fn max_entries(mut self, entries: u64) -> Self {
        self.capacity = Capacity::Entries(entries);
        self
    }

    /// Limits each namespace to approximately `bytes` bytes of stored values.
    pub fn max_bytes(mut self, bytes: u64) -> Self {
        self.capacity = Capacity::Bytes(bytes);
        self
    }

    /// Sets a custom label for this backend.
    ///
    /// # Default
    ///
    /// `"moka"`
    pub fn label(mut self, label: impl Into<BackendLabel>) -> Self {
        self.label = label.into();
        self
    }

    /// Sets the eviction policy used when a namespace reaches capacity.
    ///
    /// # Default
    ///
    /// [`EvictionPolicy::tiny_lfu()`] for entry capacity,
    /// [`EvictionPolicy::lru()`] for byte capacity.
    pub fn eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = Some(policy);
        self
    }

    /// Sets the value serialization format.
    pub fn value_format<NewS>(self, serializer: NewS) -> MokaBackendBuilder<NewS>
    where
        NewS: Format,
    {
        MokaBackendBuilder {
            capacity: self.capacity,
            serializer,
            label: self.label,
            eviction_policy: self.eviction_policy,
        }
    }

    /// Builds the backend.
    pub fn build(self) -> MokaBackend<S> {
        MokaBackend {
            namespaces: Arc::new(DashMap::new()),
            template: NamespaceTemplate {
                capacity: self.capacity,
                eviction_policy: self.eviction_policy,
            },
            serializer: self.serializer,
            label: self.label,
        }
    }
}

/// Settings applied to every namespace cache created by a backend.
#[derive(Clone)]
pub(crate) struct NamespaceTemplate {
    capacity: Capacity,
    eviction_policy: Option<EvictionPolicy>,
}

impl NamespaceTemplate {
    pub(crate) fn build(&self) -> Cache<CacheKey, Raw> {
        match self.capacity {
            Capacity::Entries(entries) => Cache::builder()
                .max_capacity(entries)
                .eviction_policy(
                    self.eviction_policy
                        .clone()
                        .unwrap_or_else(EvictionPolicy::tiny_lfu),
                )
                .build(),
            Capacity::Bytes(bytes) => Cache::builder()
                .max_capacity(bytes)
                .weigher(|key: &CacheKey, value: &Raw| -> u32 {
                    (key.memory_size() + value.len())
                        .try_into()
                        .unwrap_or(u32::MAX)
                })
                .eviction_policy(
                    self.eviction_policy
                        .clone()
                        .unwrap_or_else(EvictionPolicy::lru),
                )
                .build(),
        }
    }
}
