//! Value serialization formats.
//!
//! Backends store [`CacheEntry`] values as [`Raw`] bytes. A [`Format`]
//! converts between the two. [`JsonFormat`] is the default: it is slower
//! and larger but stored entries stay human-readable. [`BincodeFormat`] is
//! compact and fast.

use haven_core::{CacheEntry, Raw};
use thiserror::Error;

mod bincode;
mod json;

pub use self::bincode::BincodeFormat;
pub use self::json::JsonFormat;

/// Error raised while encoding or decoding an entry.
#[derive(Error, Debug)]
pub enum FormatError {
    /// Encoding failed.
    #[error(transparent)]
    Serialize(Box<dyn std::error::Error + Send>),

    /// Decoding failed.
    #[error(transparent)]
    Deserialize(Box<dyn std::error::Error + Send>),
}

/// Unique identifier for format types, used to compare format equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatTypeId {
    /// [`JsonFormat`].
    Json,
    /// [`BincodeFormat`].
    Bincode,
    /// For user-defined formats. The string should be a unique identifier.
    Custom(&'static str),
}

/// Entry serialization format.
pub trait Format: std::fmt::Debug + Send + Sync {
    /// Encodes an entry into bytes.
    fn encode(&self, entry: &CacheEntry) -> Result<Raw, FormatError>;

    /// Decodes an entry previously produced by [`Format::encode`].
    fn decode(&self, data: &[u8]) -> Result<CacheEntry, FormatError>;

    /// Clones the format into a box.
    fn clone_box(&self) -> Box<dyn Format>;

    /// Identifier of the format.
    fn format_type_id(&self) -> FormatTypeId;
}

impl Clone for Box<dyn Format> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}
