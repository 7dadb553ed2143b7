//! Orchestration of feature resolution and search for the Cartosift engine.
//!
//! Responsibilities:
//! - Resolve identifiers into centred features ([`FeatureResolver`]) and
//!   guard single-slot displays against stale completions
//!   ([`RequestTracker`]).
//! - Merge local category matches with geocoder results in a debounced
//!   [`SearchSession`].
//! - Query all tagged elements inside an area ([`OverpassSearch`]).
//!
//! Boundaries:
//! - Network access goes through [`cartosift_core::JsonFetcher`]; no HTTP
//!   client lives here.
//! - Cache and catalog are injected by the caller.
//!
//! No lock is held across an `.await`.

#![forbid(unsafe_code)]

pub mod endpoints;
pub mod error;
pub mod overpass;
pub mod resolver;
pub mod search;

pub use endpoints::{
    DEFAULT_OSM_API_BASE, DEFAULT_OVERPASS_TIMEOUT_SECS, DEFAULT_OVERPASS_URL,
    DEFAULT_PHOTON_URL, MAX_GEOCODER_ZOOM, ServiceEndpoints, Viewport,
};
pub use error::{EndpointError, RemoteError};
pub use overpass::{MapFeature, OverpassSearch};
pub use resolver::{FeatureResolver, RequestTicket, RequestTracker, ResolveError, Resolved};
pub use search::{
    DEFAULT_DEBOUNCE, DEFAULT_MIN_LOCAL_CHARS, SEARCH_QUEUE, SearchConfig, SearchOption,
    SearchSession, SearchSnapshot, SearchState, merge_options,
};
