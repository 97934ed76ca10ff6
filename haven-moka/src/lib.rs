//! In-memory namespace backend for haven, powered by [Moka](https://docs.rs/moka).
//!
//! Every namespace is an independent `moka::future::Cache`. Deleting a
//! namespace drops its cache as a whole, which is how a generation bump
//! replaces old entries.
//!
//! ```
//! use haven_moka::MokaBackend;
//!
//! let backend = MokaBackend::builder().max_entries(10_000).build();
//! ```
#![warn(missing_docs)]

mod backend;
mod builder;

pub use backend::MokaBackend;
pub use builder::{Capacity, MokaBackendBuilder};
pub use moka::policy::EvictionPolicy;
