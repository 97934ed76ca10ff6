//! Traits and structs for haven storage backends.
//!
//! A backend stores raw, already-serialized entries inside named
//! namespaces. The policy engine never serializes entries itself: it goes
//! through [`CacheBackend`], which pairs the raw [`Backend`] operations with
//! the backend's value [`Format`](format::Format).
//!
//! If you want to implement your own backend, implement [`Backend`]; the
//! typed [`CacheBackend`] operations come for free.
mod backend;
mod error;
pub mod format;

pub use backend::{Backend, BackendResult, CacheBackend};
pub use error::BackendError;
pub use format::FormatError;

/// Status of a delete operation.
#[derive(Debug, PartialEq, Eq)]
pub enum DeleteStatus {
    /// Record successfully deleted, with the number of removed records.
    Deleted(u32),
    /// Record already missing.
    Missing,
}
