//! Stored cache entries.
//!
//! A [`CacheEntry`] is what a namespace holds for a [`CacheKey`](crate::CacheKey):
//! the complete response plus the time it was written. Entries are built
//! only after the full response has been received, so a reader never
//! observes a partially written entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Response;

/// A response stored in a cache namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    response: Response,
    stored_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Wraps a response, stamping it with the current time.
    pub fn new(response: Response) -> Self {
        Self::with_stored_at(response, Utc::now())
    }

    /// Wraps a response with an explicit storage timestamp.
    pub fn with_stored_at(response: Response, stored_at: DateTime<Utc>) -> Self {
        Self {
            response,
            stored_at,
        }
    }

    /// The stored response.
    #[inline]
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// When the entry was written.
    #[inline]
    pub fn stored_at(&self) -> DateTime<Utc> {
        self.stored_at
    }

    /// Consumes the entry, returning the stored response.
    pub fn into_response(self) -> Response {
        self.response
    }
}

impl From<Response> for CacheEntry {
    fn from(response: Response) -> Self {
        Self::new(response)
    }
}
