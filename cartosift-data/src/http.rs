//! HTTP implementation of [`JsonFetcher`] backed by `reqwest`.
//!
//! Requests may name a logical queue. Starting a request in a queue aborts
//! the request previously started in the same queue, so a burst of search
//! keystrokes leaves at most one geocoder call running.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use cartosift_core::{FetchOptions, JsonFetcher};
//! use cartosift_data::{HttpJsonFetcher, HttpJsonFetcherConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = HttpJsonFetcherConfig::default()
//!     .with_timeout(Duration::from_secs(10))
//!     .with_user_agent("my-app/1.0");
//! let fetcher = HttpJsonFetcher::with_config(config)?;
//! let body = fetcher
//!     .fetch_json(
//!         "https://api.openstreetmap.org/api/0.6/node/123.json",
//!         &FetchOptions::default(),
//!     )
//!     .await?;
//! println!("{body}");
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use cartosift_core::{FetchError, FetchOptions, JsonFetcher};
use log::debug;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "cartosift/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Error raised when the HTTP client cannot be constructed.
#[derive(Debug, Error)]
pub enum FetcherBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// Configuration for [`HttpJsonFetcher`].
#[derive(Debug, Clone)]
pub struct HttpJsonFetcherConfig {
    /// Connect and total request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for HttpJsonFetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl HttpJsonFetcherConfig {
    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// `reqwest`-based [`JsonFetcher`] with abortable named queues.
pub struct HttpJsonFetcher {
    client: Client,
    config: HttpJsonFetcherConfig,
    queues: Mutex<HashMap<String, CancellationToken>>,
}

impl std::fmt::Debug for HttpJsonFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpJsonFetcher")
            .field("client", &self.client)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpJsonFetcher {
    /// Create a fetcher with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new() -> Result<Self, FetcherBuildError> {
        Self::with_config(HttpJsonFetcherConfig::default())
    }

    /// Create a fetcher with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn with_config(config: HttpJsonFetcherConfig) -> Result<Self, FetcherBuildError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(FetcherBuildError::HttpClient)?;
        Ok(Self {
            client,
            config,
            queues: Mutex::new(HashMap::new()),
        })
    }

    /// Register a new request in `queue`, cancelling its predecessor.
    fn enqueue(&self, queue: &str) -> CancellationToken {
        let token = CancellationToken::new();
        let previous = self
            .queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(queue.to_owned(), token.clone());
        if let Some(previous) = previous {
            debug!("aborting superseded request in queue {queue}");
            previous.cancel();
        }
        token
    }

    async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(&err, url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|err| FetchError::Decode {
                url: url.to_owned(),
                message: err.to_string(),
            })
    }

    /// Convert a reqwest error to a `FetchError`.
    fn convert_reqwest_error(&self, error: &reqwest::Error, url: &str) -> FetchError {
        if error.is_timeout() {
            return FetchError::Timeout {
                url: url.to_owned(),
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return FetchError::Http {
                url: url.to_owned(),
                status: status.as_u16(),
            };
        }

        FetchError::Network {
            url: url.to_owned(),
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl JsonFetcher for HttpJsonFetcher {
    async fn fetch_json(&self, url: &str, options: &FetchOptions) -> Result<Value, FetchError> {
        let Some(queue) = options.queue.as_deref() else {
            return self.fetch(url).await;
        };
        let token = self.enqueue(queue);
        abortable(&token, url, self.fetch(url)).await
    }
}

/// Race `request` against cancellation of `token`.
async fn abortable<F>(token: &CancellationToken, url: &str, request: F) -> Result<Value, FetchError>
where
    F: Future<Output = Result<Value, FetchError>>,
{
    tokio::select! {
        biased;
        () = token.cancelled() => Err(FetchError::Aborted { url: url.to_owned() }),
        result = request => result,
    }
}
