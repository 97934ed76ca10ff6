#![warn(missing_docs)]
//! # haven-core
//!
//! Core types for the haven offline caching agent.
//!
//! This crate holds the vocabulary shared by the policy engine (`haven`),
//! the storage backends (`haven-moka`, `haven-feoxdb`) and the network
//! adapters (`haven-reqwest`):
//!
//! - **Requests** the host runtime hands to the agent ([`RequestDescriptor`])
//! - **Responses** the agent hands back, either readable or opaque ([`Response`])
//! - **Cache identity** of a request ([`CacheKey`]) and what gets stored for it ([`CacheEntry`])
//! - **Transport** used to reach the network ([`Network`])
//!
//! ## Opaque responses
//!
//! A cross-origin `no-cors` fetch produces a response whose status and body
//! cannot be inspected. Such a response is modeled as [`Response::Opaque`]:
//! it can be stored and replayed but never validated.

pub mod entry;
pub mod key;
pub mod label;
pub mod network;
pub mod request;
pub mod response;

pub use entry::CacheEntry;
pub use key::CacheKey;
pub use label::BackendLabel;
pub use network::{FetchOptions, Network, NetworkError};
pub use request::{Credentials, RequestDescriptor, RequestMode, UnknownRequestMode};
pub use response::{Opaque, Payload, Response, ResponseType};
#[doc(hidden)]
pub use smol_str::SmolStr;

/// Raw byte data type used for serialized cache values.
/// Using `Bytes` provides efficient zero-copy cloning via reference counting.
pub type Raw = bytes::Bytes;
