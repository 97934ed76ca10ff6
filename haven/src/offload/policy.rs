use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What happens to a background write that runs too long.
///
/// In YAML: `None`, `{ Cancel: 30s }` or `{ Warn: 5s }`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeoutPolicy {
    /// Run to completion.
    #[default]
    None,
    /// Abort the write after the duration.
    Cancel(#[serde(with = "humantime_serde")] Duration),
    /// Let the write finish, but log once it took longer than the duration.
    Warn(#[serde(with = "humantime_serde")] Duration),
}

impl TimeoutPolicy {
    /// The configured limit, if any.
    pub fn limit(&self) -> Option<Duration> {
        match self {
            TimeoutPolicy::None => None,
            TimeoutPolicy::Cancel(limit) | TimeoutPolicy::Warn(limit) => Some(*limit),
        }
    }
}

/// Settings of the [`OffloadManager`](super::OffloadManager).
///
/// ```
/// use std::time::Duration;
/// use haven::offload::{OffloadConfig, TimeoutPolicy};
///
/// let config = OffloadConfig::default()
///     .cancel_after(Duration::from_secs(30))
///     .deduplicate(true);
/// assert_eq!(config.timeout, TimeoutPolicy::Cancel(Duration::from_secs(30)));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OffloadConfig {
    /// Limit applied to every background write.
    pub timeout: TimeoutPolicy,
    /// Skip a write-back while one for the same entry is still in flight.
    ///
    /// Off by default, so concurrent writes of an entry resolve as
    /// last-writer-wins.
    pub deduplicate: bool,
}

impl OffloadConfig {
    /// Replaces the timeout policy.
    pub fn timeout(mut self, policy: TimeoutPolicy) -> Self {
        self.timeout = policy;
        self
    }

    /// Aborts writes that run longer than `limit`.
    pub fn cancel_after(self, limit: Duration) -> Self {
        self.timeout(TimeoutPolicy::Cancel(limit))
    }

    /// Turns write deduplication on or off.
    pub fn deduplicate(mut self, enabled: bool) -> Self {
        self.deduplicate = enabled;
        self
    }
}
