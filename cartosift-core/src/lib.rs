//! Core domain types for the Cartosift engine.
//!
//! Responsibilities:
//! - Encode and decode entity identifiers ([`EntityRef`]).
//! - Resolve raw element payloads into typed [`Feature`] geometry.
//! - Hold session-wide centre knowledge ([`CenterCache`]).
//! - Score the static category [`Catalog`] against query text.
//! - Define the [`JsonFetcher`] and [`Classifier`] seams implemented by
//!   adapters.
//!
//! Boundaries:
//! - No network I/O here; adapters live in `cartosift-data`.
//! - Orchestration of fetches lives in `cartosift-engine`.
//!
//! Geometry and matching are fail-soft: degenerate input produces partial
//! output rather than errors.

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod catalog;
pub mod center_cache;
pub mod element;
pub mod entity;
pub mod feature;
pub mod fetch;
pub mod geometry;
pub mod matcher;

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-support")))]
pub mod test_support;

pub use catalog::{Catalog, CatalogError, CategoryEntry};
pub use center_cache::CenterCache;
pub use element::{
    CenterElement, CenterResponse, ElementsResponse, LatLon, RawElement, RawMember, Tags,
};
pub use entity::{ElementKind, EntityRef, IdentifierError, decode, encode};
pub use feature::{Classification, Classifier, Feature, TagClassifier};
pub use fetch::{FetchError, FetchOptions, JsonFetcher, decode_body};
pub use geometry::{FeatureGeometry, resolve_elements};
pub use matcher::{CategoryMatches, NAME_WEIGHT, ScoredMatch, count_matches, score, score_entry};
