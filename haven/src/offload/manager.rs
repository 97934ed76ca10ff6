use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use haven_core::CacheKey;
use smol_str::SmolStr;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info_span, warn};

use super::policy::{OffloadConfig, TimeoutPolicy};

/// Identity of a background write: one entry of one namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OffloadKey {
    /// Target namespace.
    pub namespace: SmolStr,
    /// Entry key.
    pub key: CacheKey,
}

impl OffloadKey {
    /// Key of a write of `key` into `namespace`.
    pub fn write(namespace: impl Into<SmolStr>, key: CacheKey) -> Self {
        Self {
            namespace: namespace.into(),
            key,
        }
    }
}

/// A running or finished task.
#[derive(Debug)]
struct Tracked {
    key: OffloadKey,
    handle: JoinHandle<()>,
}

impl Tracked {
    fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

#[derive(Debug)]
struct Shared {
    config: OffloadConfig,
    // Spawn id -> task. Two writes of the same entry get distinct ids.
    tasks: DashMap<u64, Tracked>,
    next_id: AtomicU64,
}

/// Runs fire-and-forget work on the tokio runtime and keeps track of it.
///
/// Cloning is cheap; clones see the same tasks.
#[derive(Clone, Debug)]
pub struct OffloadManager {
    shared: Arc<Shared>,
}

impl OffloadManager {
    /// Creates a manager with `config`.
    pub fn new(config: OffloadConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                tasks: DashMap::new(),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    fn next_id(&self) -> u64 {
        self.shared.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Spawns `task` under `key`.
    ///
    /// Returns `false` without spawning when deduplication is on and a write
    /// with the same key is still running.
    pub fn spawn_with_key<F>(&self, key: OffloadKey, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.shared.config.deduplicate && self.is_in_flight(&key) {
            debug!(?key, "write already in flight, skipping");
            crate::metrics::record_offload_deduplicated(&key.namespace);
            return false;
        }

        crate::metrics::record_offload_spawned(&key.namespace);
        let id = self.next_id();
        // The task waits for its registration so that its own removal
        // always comes after the insert.
        let (registered, ready) = oneshot::channel();
        let handle = self.launch(id, key.clone(), ready, task);
        self.shared.tasks.insert(id, Tracked { key, handle });
        let _ = registered.send(());
        true
    }

    fn launch<F>(
        &self,
        id: u64,
        key: OffloadKey,
        ready: oneshot::Receiver<()>,
        task: F,
    ) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let shared = self.shared.clone();
        let policy = self.shared.config.timeout;
        let namespace = key.namespace.clone();
        let span = info_span!("offload_task", namespace = %namespace, key = %key.key);

        tokio::spawn(
            async move {
                let _ = ready.await;
                let start = Instant::now();
                let completed = run(policy, task).await;
                let elapsed = start.elapsed();
                match policy {
                    TimeoutPolicy::Cancel(limit) if !completed => {
                        warn!(limit_ms = limit.as_millis(), "offload task cancelled");
                    }
                    TimeoutPolicy::Warn(limit) if elapsed > limit => {
                        warn!(
                            elapsed_ms = elapsed.as_millis(),
                            limit_ms = limit.as_millis(),
                            "offload task ran past its limit"
                        );
                    }
                    _ => {}
                }
                shared.tasks.remove(&id);
                crate::metrics::record_offload_finished(&namespace, elapsed, completed);
            }
            .instrument(span),
        )
    }

    /// Number of tasks still running.
    pub fn active_task_count(&self) -> usize {
        self.shared.tasks.iter().filter(|t| t.is_running()).count()
    }

    /// Forgets handles of finished tasks.
    pub fn cleanup_finished(&self) {
        self.shared.tasks.retain(|_, task| task.is_running());
    }

    /// Aborts every running task.
    pub fn cancel_all(&self) {
        for task in self.shared.tasks.iter() {
            task.handle.abort();
        }
    }

    /// Whether a task with `key` is running.
    pub fn is_in_flight(&self, key: &OffloadKey) -> bool {
        self.shared
            .tasks
            .iter()
            .any(|t| &t.key == key && t.is_running())
    }

    /// Resolves once every tracked task has finished, including tasks
    /// spawned while waiting.
    pub async fn wait_all(&self) {
        loop {
            self.cleanup_finished();
            if self.shared.tasks.is_empty() {
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    /// Like [`wait_all`](Self::wait_all), giving up after `limit`.
    ///
    /// Returns `true` if every task finished in time.
    pub async fn wait_all_timeout(&self, limit: Duration) -> bool {
        tokio::time::timeout(limit, self.wait_all()).await.is_ok()
    }
}

impl Default for OffloadManager {
    fn default() -> Self {
        Self::new(OffloadConfig::default())
    }
}

// Returns whether the task ran to completion.
async fn run<F>(policy: TimeoutPolicy, task: F) -> bool
where
    F: Future<Output = ()>,
{
    match policy {
        TimeoutPolicy::Cancel(limit) => tokio::time::timeout(limit, task).await.is_ok(),
        TimeoutPolicy::None | TimeoutPolicy::Warn(_) => {
            task.await;
            true
        }
    }
}
