//! Background task execution.
//!
//! Navigation write-back is fire-and-forget: the fresh document is returned
//! to the caller while the copy is written to the static-assets namespace on
//! a separate task. The [`OffloadManager`] tracks those tasks so that a host
//! (or a test) can detach from them or wait for them to settle.
//!
//! # Example
//!
//! ```ignore
//! use haven::offload::{OffloadConfig, OffloadKey, OffloadManager};
//!
//! let manager = OffloadManager::new(OffloadConfig::default());
//! manager.spawn_with_key(OffloadKey::write("static-assets-v1", key), async {
//!     // store the response
//! });
//! manager.wait_all().await;
//! ```

mod manager;
mod policy;

pub use manager::{OffloadKey, OffloadManager};
pub use policy::{OffloadConfig, TimeoutPolicy};
