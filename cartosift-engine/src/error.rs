//! Error types shared by the remote-facing engine components.

use cartosift_core::FetchError;
use thiserror::Error;

/// A configured service URL could not be turned into a request URL.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid service URL {url:?}: {source}")]
pub struct EndpointError {
    /// The offending base URL.
    pub url: String,
    /// Parser error from the `url` crate.
    #[source]
    pub source: url::ParseError,
}

/// Failure of a remote lookup that has no domain-specific meaning.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The request URL could not be built.
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
    /// The fetch collaborator failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

impl RemoteError {
    /// Report whether the request was aborted by a newer one.
    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        matches!(self, Self::Fetch(FetchError::Aborted { .. }))
    }
}
