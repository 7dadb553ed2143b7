//! Test-only, scripted `JsonFetcher` used by unit and behaviour tests.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::fetch::{FetchError, FetchOptions, JsonFetcher};

/// A request observed by [`StubFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    /// Requested URL.
    pub url: String,
    /// Queue named in the request options.
    pub queue: Option<String>,
}

#[derive(Debug, Clone)]
struct StubRoute {
    pattern: String,
    reply: Result<Value, FetchError>,
    delay: Option<Duration>,
}

/// `JsonFetcher` answering from pre-configured routes.
///
/// The first route whose pattern is a substring of the requested URL wins.
/// Unrouted URLs answer with HTTP 404. Every call is recorded before the
/// optional delay elapses, so tests can count requests that are still in
/// flight. Delays use `tokio::time`, so paused-clock tests stay
/// deterministic.
#[derive(Debug, Default)]
pub struct StubFetcher {
    routes: Vec<StubRoute>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl StubFetcher {
    /// Create a fetcher without routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer URLs containing `pattern` with `body`.
    #[must_use]
    pub fn route(self, pattern: impl Into<String>, body: Value) -> Self {
        self.push(pattern.into(), Ok(body), None)
    }

    /// Answer URLs containing `pattern` with `body` after `delay`.
    #[must_use]
    pub fn route_delayed(self, pattern: impl Into<String>, body: Value, delay: Duration) -> Self {
        self.push(pattern.into(), Ok(body), Some(delay))
    }

    /// Fail URLs containing `pattern` with `error`.
    #[must_use]
    pub fn route_error(self, pattern: impl Into<String>, error: FetchError) -> Self {
        self.push(pattern.into(), Err(error), None)
    }

    /// Fail URLs containing `pattern` with `error` after `delay`.
    #[must_use]
    pub fn route_error_delayed(
        self,
        pattern: impl Into<String>,
        error: FetchError,
        delay: Duration,
    ) -> Self {
        self.push(pattern.into(), Err(error), Some(delay))
    }

    fn push(
        mut self,
        pattern: String,
        reply: Result<Value, FetchError>,
        delay: Option<Duration>,
    ) -> Self {
        self.routes.push(StubRoute {
            pattern,
            reply,
            delay,
        });
        self
    }

    /// All recorded calls, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of recorded calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of recorded calls whose URL contains `pattern`.
    #[must_use]
    pub fn calls_matching(&self, pattern: &str) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|call| call.url.contains(pattern))
            .count()
    }

    fn record(&self, url: &str, options: &FetchOptions) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedCall {
                url: url.to_owned(),
                queue: options.queue.clone(),
            });
    }
}

#[async_trait]
impl JsonFetcher for StubFetcher {
    async fn fetch_json(&self, url: &str, options: &FetchOptions) -> Result<Value, FetchError> {
        self.record(url, options);
        let Some(route) = self
            .routes
            .iter()
            .find(|route| url.contains(route.pattern.as_str()))
        else {
            return Err(FetchError::Http {
                url: url.to_owned(),
                status: 404,
            });
        };
        if let Some(delay) = route.delay {
            tokio::time::sleep(delay).await;
        }
        route.reply.clone()
    }
}
