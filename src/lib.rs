//! Facade crate for the Cartosift feature resolution and search engine.
//!
//! This crate re-exports the core domain types, the orchestration layer and,
//! behind the default `http` feature, the `reqwest`-backed adapters.
//!
//! # Examples
//!
//! ```
//! use cartosift::{EntityRef, decode, encode};
//!
//! let way = decode("w51050330")?;
//! assert_eq!(way, EntityRef::way(51_050_330));
//! assert_eq!(encode(way), "w51050330");
//! # Ok::<(), cartosift::IdentifierError>(())
//! ```

#![forbid(unsafe_code)]

pub use cartosift_core::{
    Catalog, CatalogError, CategoryEntry, CategoryMatches, CenterCache, Classification,
    Classifier, ElementKind, EntityRef, Feature, FeatureGeometry, FetchError, FetchOptions,
    IdentifierError, JsonFetcher, ScoredMatch, TagClassifier, Tags, decode, encode, score,
};

pub use cartosift_engine::{
    FeatureResolver, MapFeature, OverpassSearch, RemoteError, RequestTicket, RequestTracker,
    ResolveError, Resolved, SearchConfig, SearchOption, SearchSession, SearchSnapshot,
    SearchState, ServiceEndpoints, Viewport,
};

#[cfg(feature = "http")]
pub use cartosift_data::{
    CatalogFileError, HttpJsonFetcher, HttpJsonFetcherConfig, load_catalog,
};

#[cfg(feature = "test-support")]
pub use cartosift_core::test_support;
