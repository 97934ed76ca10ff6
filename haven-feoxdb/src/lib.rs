//! Persistent namespace backend for haven, built on FeOxDB.
//!
//! Entries survive process restarts, which is what lets an installed agent
//! keep serving its precached assets while offline.
#![warn(missing_docs)]

mod backend;
mod error;
mod index;

pub use backend::{FeOxDbBackend, FeOxDbBackendBuilder};
pub use error::FeOxDbError;
