//! Intercepted request descriptors.
//!
//! A [`RequestDescriptor`] is the read-only view of a request the host
//! runtime delivers to the agent: URL, method, mode and headers. It is never
//! persisted; the cache identity derived from it is a [`CacheKey`](crate::CacheKey).

use std::fmt;
use std::str::FromStr;

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Request mode as reported by the host runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level document navigation.
    Navigate,
    /// Same-origin only request.
    SameOrigin,
    /// Cross-origin request with CORS checks (the default for programmatic fetches).
    #[default]
    Cors,
    /// Cross-origin request without CORS, producing an opaque response.
    NoCors,
}

impl RequestMode {
    /// Returns the mode as it is spelled by the host runtime.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RequestMode::Navigate => "navigate",
            RequestMode::SameOrigin => "same-origin",
            RequestMode::Cors => "cors",
            RequestMode::NoCors => "no-cors",
        }
    }
}

impl fmt::Display for RequestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unrecognized request mode.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown request mode: {0}")]
pub struct UnknownRequestMode(pub String);

impl FromStr for RequestMode {
    type Err = UnknownRequestMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "navigate" => Ok(RequestMode::Navigate),
            "same-origin" => Ok(RequestMode::SameOrigin),
            "cors" => Ok(RequestMode::Cors),
            "no-cors" => Ok(RequestMode::NoCors),
            other => Err(UnknownRequestMode(other.to_owned())),
        }
    }
}

/// Credentials policy for an outgoing fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Credentials {
    /// Never send cookies or authorization headers.
    Omit,
    /// Send credentials only to the application origin.
    #[default]
    SameOrigin,
    /// Always send credentials.
    Include,
}

/// An intercepted request.
///
/// # Example
///
/// ```
/// use haven_core::{RequestDescriptor, RequestMode};
/// use url::Url;
///
/// let url = Url::parse("https://app.example/MagicTraining/").unwrap();
/// let request = RequestDescriptor::navigate(url);
/// assert_eq!(request.mode(), RequestMode::Navigate);
/// assert!(request.is_get());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    url: Url,
    method: Method,
    mode: RequestMode,
    headers: HeaderMap,
}

impl RequestDescriptor {
    /// Creates a `GET` request with the default `cors` mode.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            method: Method::GET,
            mode: RequestMode::default(),
            headers: HeaderMap::new(),
        }
    }

    /// Creates a top-level navigation request.
    pub fn navigate(url: Url) -> Self {
        Self::new(url).with_mode(RequestMode::Navigate)
    }

    /// Sets the request method.
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the request mode.
    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Appends a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Request URL.
    #[inline]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request method.
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request mode.
    #[inline]
    pub fn mode(&self) -> RequestMode {
        self.mode
    }

    /// Request headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Whether this is a `GET` request, the only method the cache stores.
    #[inline]
    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }

    /// Whether the request targets the same origin as `origin`.
    pub fn is_same_origin(&self, origin: &Url) -> bool {
        self.url.origin() == origin.origin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_round_trips_through_str() {
        for mode in [
            RequestMode::Navigate,
            RequestMode::SameOrigin,
            RequestMode::Cors,
            RequestMode::NoCors,
        ] {
            assert_eq!(mode.as_str().parse::<RequestMode>(), Ok(mode));
        }
    }

    #[test]
    fn test_unknown_mode() {
        assert_eq!(
            "websocket".parse::<RequestMode>(),
            Err(UnknownRequestMode("websocket".into()))
        );
    }

    #[test]
    fn test_mode_serde_uses_runtime_spelling() {
        let json = serde_json::to_string(&RequestMode::NoCors).unwrap();
        assert_eq!(json, "\"no-cors\"");
    }

    #[test]
    fn test_same_origin_ignores_path() {
        let origin = Url::parse("https://app.example/").unwrap();
        let local = RequestDescriptor::new(Url::parse("https://app.example/a/b.js").unwrap());
        let remote = RequestDescriptor::new(Url::parse("https://cdn.example/a/b.js").unwrap());
        assert!(local.is_same_origin(&origin));
        assert!(!remote.is_same_origin(&origin));
    }

    #[test]
    fn test_post_is_not_get() {
        let request = RequestDescriptor::new(Url::parse("https://app.example/api").unwrap())
            .with_method(Method::POST);
        assert!(!request.is_get());
    }
}
