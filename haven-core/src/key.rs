//! Cache key types.
//!
//! A [`CacheKey`] is the normalized identity of a request inside a cache
//! namespace: the request method and its URL with the fragment removed.
//!
//! ```
//! use haven_core::CacheKey;
//! use url::Url;
//!
//! let key = CacheKey::get(&Url::parse("https://app.example/index.html#top").unwrap());
//! assert_eq!(key.to_string(), "GET https://app.example/index.html");
//! ```
//!
//! Request mode is deliberately not part of the identity: an entry stored
//! by the install step for `/index.html` must answer a later navigation or
//! `no-cors` image request for the same URL.
//!
//! ## Performance
//!
//! Both components are [`SmolStr`], so cloning a key never copies the URL.

use std::fmt;

use http::Method;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use url::Url;

use crate::RequestDescriptor;

/// Normalized request identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey {
    method: SmolStr,
    url: SmolStr,
}

impl CacheKey {
    /// Builds a key from a method and URL.
    pub fn new(method: &Method, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        Self {
            method: SmolStr::new(method.as_str()),
            url: SmolStr::from(String::from(url)),
        }
    }

    /// Key of a `GET` request for `url`.
    pub fn get(url: &Url) -> Self {
        Self::new(&Method::GET, url)
    }

    /// Key of an intercepted request.
    pub fn for_request(request: &RequestDescriptor) -> Self {
        Self::new(request.method(), request.url())
    }

    /// Request method component.
    #[inline]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Normalized URL component.
    #[inline]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Approximate heap size of the key.
    pub fn memory_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.url.len()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}
