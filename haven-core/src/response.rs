//! Responses produced by the network or replayed from the cache.
//!
//! - [`Response::Readable`] wraps a [`Payload`] whose status, headers and
//!   body can be inspected.
//! - [`Response::Opaque`] wraps an [`Opaque`] body from a cross-origin
//!   `no-cors` fetch. Its status and content are unobservable; it can only
//!   be stored and handed back to the host.
//!
//! Cloning a response is cheap: bodies are reference-counted [`Bytes`], so a
//! copy handed to storage never locks or drains the copy returned to the caller.

use std::fmt;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, VARY};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};

/// Type of a readable response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin response.
    Basic,
    /// Cross-origin response that passed CORS checks.
    Cors,
}

/// Readable response: status, headers and body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    #[serde(with = "http_serde::status_code")]
    status: StatusCode,
    #[serde(with = "http_serde::header_map")]
    headers: HeaderMap,
    body: Bytes,
    response_type: ResponseType,
    redirected: bool,
}

impl Payload {
    /// Creates a same-origin, non-redirected payload with no headers.
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
            response_type: ResponseType::Basic,
            redirected: false,
        }
    }

    /// Appends a header.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Replaces all headers.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Sets the response type.
    pub fn with_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    /// Marks the payload as the result of following a redirect.
    pub fn with_redirected(mut self, redirected: bool) -> Self {
        self.redirected = redirected;
        self
    }

    /// Response status.
    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Response headers.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Response body.
    #[inline]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Response type.
    #[inline]
    pub fn response_type(&self) -> ResponseType {
        self.response_type
    }

    /// Whether a redirect was followed to produce this payload.
    #[inline]
    pub fn redirected(&self) -> bool {
        self.redirected
    }

    /// Value of the `Content-Type` header, if present and valid UTF-8.
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
    }
}

/// Body of an opaque cross-origin response.
///
/// Nothing about an opaque response can be validated. The body is carried
/// only so that a stored response can be replayed to the host.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Opaque {
    body: Bytes,
}

impl Opaque {
    /// Wraps a body received from a `no-cors` fetch.
    pub fn new(body: impl Into<Bytes>) -> Self {
        Self { body: body.into() }
    }

    /// Hands the body back for replay to the host runtime.
    pub fn into_replay(self) -> Bytes {
        self.body
    }

    /// Approximate memory held by this response.
    pub fn memory_size(&self) -> usize {
        self.body.len()
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Opaque { .. }")
    }
}

/// A response returned by the network or replayed from the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response {
    /// Inspectable response.
    Readable(Payload),
    /// Unobservable cross-origin response.
    Opaque(Opaque),
}

impl Response {
    /// Builds a `200 OK` `text/html` response.
    pub fn html(body: impl Into<Bytes>) -> Self {
        Response::Readable(
            Payload::new(StatusCode::OK, body).with_header(
                CONTENT_TYPE,
                HeaderValue::from_static("text/html; charset=utf-8"),
            ),
        )
    }

    /// Status of a readable response; `None` for opaque responses.
    pub fn status(&self) -> Option<StatusCode> {
        self.as_readable().map(Payload::status)
    }

    /// Returns the readable payload, if any.
    pub fn as_readable(&self) -> Option<&Payload> {
        match self {
            Response::Readable(payload) => Some(payload),
            Response::Opaque(_) => None,
        }
    }

    /// Whether this response is opaque.
    #[inline]
    pub fn is_opaque(&self) -> bool {
        matches!(self, Response::Opaque(_))
    }

    /// `200`, same-origin `basic` and not redirected.
    pub fn is_plain_same_origin_ok(&self) -> bool {
        self.as_readable().is_some_and(|payload| {
            payload.status == StatusCode::OK
                && payload.response_type == ResponseType::Basic
                && !payload.redirected
        })
    }

    /// Whether the storage layer accepts this response at all.
    ///
    /// Partial content and `Vary: *` responses are rejected. Opaque
    /// responses are always accepted since nothing about them is known.
    pub fn is_storable(&self) -> bool {
        match self {
            Response::Opaque(_) => true,
            Response::Readable(payload) => {
                payload.status != StatusCode::PARTIAL_CONTENT
                    && !payload
                        .headers
                        .get_all(VARY)
                        .iter()
                        .filter_map(|value| value.to_str().ok())
                        .flat_map(|value| value.split(','))
                        .any(|field| field.trim() == "*")
            }
        }
    }

    /// Approximate memory held by this response.
    pub fn memory_size(&self) -> usize {
        match self {
            Response::Readable(payload) => {
                payload.body.len()
                    + payload
                        .headers
                        .iter()
                        .map(|(name, value)| name.as_str().len() + value.len())
                        .sum::<usize>()
            }
            Response::Opaque(opaque) => opaque.memory_size(),
        }
    }
}

impl From<Payload> for Response {
    fn from(payload: Payload) -> Self {
        Response::Readable(payload)
    }
}

impl From<Opaque> for Response {
    fn from(opaque: Opaque) -> Self {
        Response::Opaque(opaque)
    }
}
