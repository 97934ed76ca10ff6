//! Metrics declaration and recording helpers.
//!
//! With the `metrics` feature disabled every helper is an empty inline
//! function.

use crate::classify::RoutingClass;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
lazy_static! {
    /// Track number of requests answered from a namespace.
    pub static ref CACHE_HIT_COUNTER: &'static str = {
        metrics::describe_counter!(
            "haven_cache_hit_total",
            "Total number of requests answered from the cache."
        );
        "haven_cache_hit_total"
    };
    /// Track number of requests that had to go to the network.
    pub static ref CACHE_MISS_COUNTER: &'static str = {
        metrics::describe_counter!(
            "haven_cache_miss_total",
            "Total number of requests not found in the cache."
        );
        "haven_cache_miss_total"
    };
    /// Track number of synthesized or substituted responses.
    pub static ref FALLBACK_COUNTER: &'static str = {
        metrics::describe_counter!(
            "haven_fallback_total",
            "Total number of responses served from a fallback chain."
        );
        "haven_fallback_total"
    };
    /// Track number of media URLs stored by bulk population.
    pub static ref POPULATION_STORED: &'static str = {
        metrics::describe_counter!(
            "haven_population_stored_total",
            "Total number of media URLs stored by bulk population."
        );
        "haven_population_stored_total"
    };
    /// Track number of media URLs that bulk population failed to store.
    pub static ref POPULATION_FAILED: &'static str = {
        metrics::describe_counter!(
            "haven_population_failed_total",
            "Total number of media URLs bulk population failed to store."
        );
        "haven_population_failed_total"
    };
    /// Track number of stale namespaces deleted on activation.
    pub static ref NAMESPACES_SWEPT: &'static str = {
        metrics::describe_counter!(
            "haven_namespaces_swept_total",
            "Total number of stale namespaces deleted."
        );
        "haven_namespaces_swept_total"
    };

    /// Background writes started.
    pub static ref OFFLOAD_SPAWNED: &'static str = {
        metrics::describe_counter!(
            "haven_offload_spawned_total",
            "Background tasks started."
        );
        "haven_offload_spawned_total"
    };
    /// Background writes finished, labelled by outcome.
    pub static ref OFFLOAD_FINISHED: &'static str = {
        metrics::describe_counter!(
            "haven_offload_finished_total",
            "Background tasks finished, by outcome (completed or cancelled)."
        );
        "haven_offload_finished_total"
    };
    /// Background writes skipped by deduplication.
    pub static ref OFFLOAD_DEDUPLICATED: &'static str = {
        metrics::describe_counter!(
            "haven_offload_deduplicated_total",
            "Background writes skipped because one for the same entry was in flight."
        );
        "haven_offload_deduplicated_total"
    };
    /// Background tasks running.
    pub static ref OFFLOAD_ACTIVE: &'static str = {
        metrics::describe_gauge!(
            "haven_offload_active",
            "Background tasks currently running."
        );
        "haven_offload_active"
    };
    /// Background task duration.
    pub static ref OFFLOAD_DURATION: &'static str = {
        metrics::describe_histogram!(
            "haven_offload_duration_seconds",
            metrics::Unit::Seconds,
            "Time from start to completion or cancellation of a background task."
        );
        "haven_offload_duration_seconds"
    };
}

#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn record_hit(class: RoutingClass) {
    metrics::counter!(*CACHE_HIT_COUNTER, "class" => class.as_str()).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_hit(_class: RoutingClass) {}

#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn record_miss(class: RoutingClass) {
    metrics::counter!(*CACHE_MISS_COUNTER, "class" => class.as_str()).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_miss(_class: RoutingClass) {}

#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn record_fallback(class: RoutingClass) {
    metrics::counter!(*FALLBACK_COUNTER, "class" => class.as_str()).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_fallback(_class: RoutingClass) {}

#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn record_population(stored: usize, failed: usize) {
    metrics::counter!(*POPULATION_STORED).increment(stored as u64);
    metrics::counter!(*POPULATION_FAILED).increment(failed as u64);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_population(_stored: usize, _failed: usize) {}

#[cfg(feature = "metrics")]
#[inline]
pub(crate) fn record_sweep(deleted: usize) {
    metrics::counter!(*NAMESPACES_SWEPT).increment(deleted as u64);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_sweep(_deleted: usize) {}

#[cfg(feature = "metrics")]
pub(crate) fn record_offload_spawned(namespace: &str) {
    metrics::counter!(*OFFLOAD_SPAWNED, "namespace" => namespace.to_owned()).increment(1);
    metrics::gauge!(*OFFLOAD_ACTIVE, "namespace" => namespace.to_owned()).increment(1.0);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_offload_spawned(_namespace: &str) {}

#[cfg(feature = "metrics")]
pub(crate) fn record_offload_deduplicated(namespace: &str) {
    metrics::counter!(*OFFLOAD_DEDUPLICATED, "namespace" => namespace.to_owned()).increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_offload_deduplicated(_namespace: &str) {}

#[cfg(feature = "metrics")]
pub(crate) fn record_offload_finished(namespace: &str, elapsed: std::time::Duration, completed: bool) {
    let outcome = if completed { "completed" } else { "cancelled" };
    metrics::counter!(*OFFLOAD_FINISHED, "namespace" => namespace.to_owned(), "outcome" => outcome)
        .increment(1);
    metrics::gauge!(*OFFLOAD_ACTIVE, "namespace" => namespace.to_owned()).decrement(1.0);
    metrics::histogram!(*OFFLOAD_DURATION, "namespace" => namespace.to_owned()).record(elapsed.as_secs_f64());
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub(crate) fn record_offload_finished(_namespace: &str, _elapsed: std::time::Duration, _completed: bool) {}
