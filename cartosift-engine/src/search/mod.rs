//! Debounced search combining local category matches with a remote geocoder.
//!
//! Every call to [`SearchSession::update`] with new text takes the next
//! sequence number. Local scoring runs synchronously and is published at
//! once; the geocoder call waits for the debounce delay and is only issued
//! when no newer text arrived meanwhile. A remote answer is merged only while
//! its sequence number is still the latest, so superseded responses never
//! reach subscribers.
//!
//! State changes are published as [`SearchSnapshot`] values on a
//! [`tokio::sync::watch`] channel.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use cartosift_core::{
    Catalog, CategoryMatches, FetchOptions, JsonFetcher, ScoredMatch, decode_body, score,
};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::watch;

use crate::endpoints::{ServiceEndpoints, Viewport};
use crate::error::RemoteError;

/// Abortable queue shared by all geocoder requests of a session.
pub const SEARCH_QUEUE: &str = "search";
/// Delay between the last keystroke and the geocoder request.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);
/// Shortest query, in characters, scored against the local catalog.
pub const DEFAULT_MIN_LOCAL_CHARS: usize = 3;

/// One entry of the published option list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum SearchOption {
    /// A catalog category matching the query.
    Category(ScoredMatch),
    /// A geocoder feature, passed through untouched.
    Place(Value),
    /// Placeholder shown while the geocoder call is pending.
    Loading,
}

impl SearchOption {
    /// Text shown for the option, when it has one.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Category(hit) => Some(hit.entry.display_name()),
            Self::Place(feature) => feature.pointer("/properties/name").and_then(Value::as_str),
            Self::Loading => None,
        }
    }
}

/// Lifecycle of the active query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchState {
    /// No query.
    #[default]
    Idle,
    /// Local matches published; the geocoder call is still debounced.
    LocalScored,
    /// The geocoder call is in flight.
    AwaitingRemote,
    /// Final options for the query are published.
    Settled,
}

/// Published view of the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchSnapshot {
    /// Sequence number of the query the snapshot belongs to.
    pub sequence: u64,
    /// Query text.
    pub query: String,
    /// Lifecycle state.
    pub state: SearchState,
    /// Options in display order.
    pub options: Vec<SearchOption>,
}

/// Tunables of a [`SearchSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Delay before the geocoder call is issued.
    pub debounce: Duration,
    /// Shortest query scored against the catalog.
    pub min_local_chars: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            min_local_chars: DEFAULT_MIN_LOCAL_CHARS,
        }
    }
}

impl SearchConfig {
    /// Set the debounce delay.
    #[must_use]
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

#[derive(Debug, Deserialize)]
struct GeocoderResponse {
    #[serde(default)]
    features: Vec<Value>,
}

/// Merge local and remote results: name matches, then places, then the
/// remaining category matches.
#[must_use]
pub fn merge_options(local: &CategoryMatches, places: Vec<Value>) -> Vec<SearchOption> {
    local
        .name_matches
        .iter()
        .cloned()
        .map(SearchOption::Category)
        .chain(places.into_iter().map(SearchOption::Place))
        .chain(local.rest.iter().cloned().map(SearchOption::Category))
        .collect()
}

/// A search box session.
///
/// Cloning yields another handle to the same session.
#[derive(Debug)]
pub struct SearchSession<F> {
    inner: Arc<Inner<F>>,
}

impl<F> Clone for SearchSession<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[derive(Debug)]
struct Inner<F> {
    fetcher: F,
    catalog: Arc<Catalog>,
    endpoints: ServiceEndpoints,
    config: SearchConfig,
    sequence: AtomicU64,
    snapshots: watch::Sender<SearchSnapshot>,
}

impl<F> SearchSession<F>
where
    F: JsonFetcher + 'static,
{
    /// Create an idle session.
    pub fn new(fetcher: F, catalog: Arc<Catalog>, endpoints: ServiceEndpoints) -> Self {
        Self::with_config(fetcher, catalog, endpoints, SearchConfig::default())
    }

    /// Create an idle session with explicit tunables.
    pub fn with_config(
        fetcher: F,
        catalog: Arc<Catalog>,
        endpoints: ServiceEndpoints,
        config: SearchConfig,
    ) -> Self {
        let (snapshots, _) = watch::channel(SearchSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                fetcher,
                catalog,
                endpoints,
                config,
                sequence: AtomicU64::new(0),
                snapshots,
            }),
        }
    }

    /// Subscribe to published snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SearchSnapshot> {
        self.inner.snapshots.subscribe()
    }

    /// The latest published snapshot.
    #[must_use]
    pub fn snapshot(&self) -> SearchSnapshot {
        self.inner.snapshots.borrow().clone()
    }

    /// Feed new query text and return the sequence number of the query now
    /// active.
    ///
    /// Identical text is a no-op. Empty text resets the session to
    /// [`SearchState::Idle`] immediately. Any other text publishes local
    /// matches (when long enough) and schedules a debounced geocoder call on
    /// the current Tokio runtime. Without a runtime the geocoder is skipped
    /// and the local matches are settled at once.
    pub fn update(&self, text: &str, viewport: Viewport) -> u64 {
        {
            let current = self.inner.snapshots.borrow();
            if current.query == text {
                return current.sequence;
            }
        }
        let sequence = self.inner.sequence.fetch_add(1, Ordering::AcqRel) + 1;

        if text.is_empty() {
            debug!("search {sequence}: cleared");
            self.inner.snapshots.send_replace(SearchSnapshot {
                sequence,
                ..SearchSnapshot::default()
            });
            return sequence;
        }

        let local = self.inner.score_locally(text);
        let (state, options) = match &local {
            Some(matches) => {
                let mut options: Vec<SearchOption> = matches
                    .name_matches
                    .iter()
                    .cloned()
                    .map(SearchOption::Category)
                    .collect();
                options.push(SearchOption::Loading);
                (SearchState::LocalScored, options)
            }
            None => (SearchState::AwaitingRemote, vec![SearchOption::Loading]),
        };
        self.inner.snapshots.send_replace(SearchSnapshot {
            sequence,
            query: text.to_owned(),
            state,
            options,
        });

        let Ok(runtime) = Handle::try_current() else {
            warn!("search {sequence}: no Tokio runtime, skipping the geocoder");
            self.inner.publish_if_current(
                sequence,
                SearchState::Settled,
                Some(merge_options(&local.unwrap_or_default(), Vec::new())),
            );
            return sequence;
        };
        let inner = Arc::clone(&self.inner);
        let query = text.to_owned();
        runtime.spawn(async move {
            inner
                .run_remote(sequence, query, viewport, local.unwrap_or_default())
                .await;
        });
        sequence
    }

    /// Run one undebounced search and return the merged options.
    ///
    /// The session's snapshots are left untouched. A geocoder failure is
    /// logged and yields the local matches alone.
    pub async fn search_once(&self, text: &str, viewport: Viewport) -> Vec<SearchOption> {
        if text.is_empty() {
            return Vec::new();
        }
        let local = self.inner.score_locally(text).unwrap_or_default();
        match self.inner.fetch_places(text, viewport).await {
            Ok(places) => merge_options(&local, places),
            Err(err) => {
                warn!("geocoder lookup for {text:?} failed: {err}");
                merge_options(&local, Vec::new())
            }
        }
    }
}

impl<F: JsonFetcher> Inner<F> {
    fn score_locally(&self, text: &str) -> Option<CategoryMatches> {
        (text.chars().count() >= self.config.min_local_chars).then(|| score(&self.catalog, text))
    }

    fn is_current(&self, sequence: u64) -> bool {
        self.sequence.load(Ordering::Acquire) == sequence
    }

    /// Update the snapshot only while `sequence` is still the active query.
    fn publish_if_current(
        &self,
        sequence: u64,
        state: SearchState,
        options: Option<Vec<SearchOption>>,
    ) {
        self.snapshots.send_if_modified(|snapshot| {
            if snapshot.sequence != sequence || !self.is_current(sequence) {
                return false;
            }
            snapshot.state = state;
            if let Some(options) = options {
                snapshot.options = options;
            }
            true
        });
    }

    async fn run_remote(
        &self,
        sequence: u64,
        query: String,
        viewport: Viewport,
        local: CategoryMatches,
    ) {
        tokio::time::sleep(self.config.debounce).await;
        if !self.is_current(sequence) {
            debug!("search {sequence}: superseded before dispatch");
            return;
        }
        self.publish_if_current(sequence, SearchState::AwaitingRemote, None);

        let result = self.fetch_places(&query, viewport).await;
        if !self.is_current(sequence) {
            debug!("search {sequence}: discarding superseded geocoder response");
            return;
        }
        let places = match result {
            Ok(places) => places,
            Err(err) if err.is_aborted() => {
                debug!("search {sequence}: geocoder request aborted");
                Vec::new()
            }
            Err(err) => {
                warn!("geocoder lookup for {query:?} failed: {err}");
                Vec::new()
            }
        };
        self.publish_if_current(
            sequence,
            SearchState::Settled,
            Some(merge_options(&local, places)),
        );
    }

    async fn fetch_places(
        &self,
        text: &str,
        viewport: Viewport,
    ) -> Result<Vec<Value>, RemoteError> {
        let url = self.endpoints.geocoder_url(text, viewport)?;
        let body = self
            .fetcher
            .fetch_json(url.as_str(), &FetchOptions::in_queue(SEARCH_QUEUE))
            .await?;
        let response: GeocoderResponse = decode_body(url.as_str(), body)?;
        Ok(response.features)
    }
}
