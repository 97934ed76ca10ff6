//! [`Network`](haven_core::Network) implementation backed by a
//! [`reqwest::Client`].
//!
//! [`ReqwestNetwork`] lets a [`CacheAgent`] run outside a browser: it
//! performs real HTTP fetches and reproduces the response classification a
//! browser would make (same-origin `basic`, cross-origin `cors`, or opaque
//! for cross-origin `no-cors` fetches).
//!
//! ```no_run
//! use haven_reqwest::ReqwestNetwork;
//! use url::Url;
//!
//! let origin = Url::parse("https://app.example/").unwrap();
//! let network = ReqwestNetwork::new(origin);
//! ```
//!
//! Enable the `default-tls` feature to reach `https` URLs.
//!
//! [`CacheAgent`]: https://docs.rs/haven/latest/haven/struct.CacheAgent.html
#![warn(missing_docs)]

mod network;

pub use network::ReqwestNetwork;
