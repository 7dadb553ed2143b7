//! The JSON-fetching capability consumed by resolvers and search sessions.
//!
//! Transport, timeouts and retries belong to implementations; this crate only
//! defines the seam and its error taxonomy.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Per-request options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Logical queue name. Implementations that support it abort the
    /// previous in-flight request sharing the same queue.
    pub queue: Option<String>,
}

impl FetchOptions {
    /// Options placing the request in the named abortable queue.
    #[must_use]
    pub fn in_queue(name: impl Into<String>) -> Self {
        Self {
            queue: Some(name.into()),
        }
    }
}

/// Errors from [`JsonFetcher::fetch_json`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The request could not be sent or the connection failed.
    #[error("request to {url} failed: {message}")]
    Network {
        /// Requested URL.
        url: String,
        /// Transport error description.
        message: String,
    },
    /// The request exceeded the configured timeout.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },
    /// The service answered with a non-success status.
    #[error("request to {url} returned HTTP {status}")]
    Http {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// A newer request in the same queue superseded this one.
    #[error("request to {url} was aborted")]
    Aborted {
        /// Requested URL.
        url: String,
    },
    /// The body was not valid JSON or did not have the expected shape.
    #[error("failed to decode response from {url}: {message}")]
    Decode {
        /// Requested URL.
        url: String,
        /// Parser error description.
        message: String,
    },
}

impl FetchError {
    /// Report whether the service said the resource does not exist.
    #[must_use]
    pub const fn is_gone(&self) -> bool {
        matches!(self, Self::Http { status: 404 | 410, .. })
    }
}

/// Asynchronously fetch and parse a JSON document.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use cartosift_core::{FetchError, FetchOptions, JsonFetcher};
/// use serde_json::{Value, json};
///
/// struct Echo;
///
/// #[async_trait]
/// impl JsonFetcher for Echo {
///     async fn fetch_json(&self, url: &str, _: &FetchOptions) -> Result<Value, FetchError> {
///         Ok(json!({ "url": url }))
///     }
/// }
/// ```
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    /// Fetch `url` and parse the body as JSON.
    async fn fetch_json(&self, url: &str, options: &FetchOptions) -> Result<Value, FetchError>;
}

#[async_trait]
impl<T> JsonFetcher for Arc<T>
where
    T: JsonFetcher + ?Sized,
{
    async fn fetch_json(&self, url: &str, options: &FetchOptions) -> Result<Value, FetchError> {
        (**self).fetch_json(url, options).await
    }
}

/// Decode a fetched document into a typed wire shape.
///
/// # Errors
///
/// Returns [`FetchError::Decode`] when the value does not match `T`.
pub fn decode_body<T>(url: &str, body: Value) -> Result<T, FetchError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(body).map_err(|err| FetchError::Decode {
        url: url.to_owned(),
        message: err.to_string(),
    })
}
