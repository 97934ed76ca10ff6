use haven_backend::BackendError;
use haven_core::NetworkError;
use thiserror::Error;
use url::Url;

use crate::agent::AgentState;

/// Error type for agent operations.
#[derive(Debug, Error)]
pub enum HavenError {
    /// The storage backend failed.
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The network produced no response.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// A mandatory asset could not be precached; installation did not complete.
    #[error("failed to precache {url}: {reason}")]
    Install {
        /// Asset that failed.
        url: Url,
        /// Why it failed.
        reason: String,
    },

    /// A navigation failed and no cached document could stand in for it.
    #[error("navigation to {url} failed and no cached document is available")]
    NavigationUnavailable {
        /// The requested document.
        url: Url,
    },

    /// The response or request cannot be stored under cache rules.
    #[error("cannot store {url}: {reason}")]
    NotStorable {
        /// Request URL.
        url: String,
        /// Rule that rejected it.
        reason: &'static str,
    },

    /// A lifecycle event arrived in a state that does not accept it.
    #[error("cannot {event} while the agent is {state}")]
    InvalidState {
        /// The rejected event.
        event: &'static str,
        /// State at the time of the event.
        state: AgentState,
    },

    /// A configured or received URL could not be parsed.
    #[error("invalid url {input:?}: {source}")]
    InvalidUrl {
        /// The offending input.
        input: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },

    /// The configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),
}
