//! Data access adapters for the Cartosift engine.
//!
//! Responsibilities:
//! - Implement [`cartosift_core::JsonFetcher`] over HTTP with abortable
//!   request queues.
//! - Load the static category catalog from disk.
//!
//! A request issued in a named queue aborts the one still pending in that
//! queue, which then fails with [`cartosift_core::FetchError::Aborted`].
//! Requests without a queue never abort each other, and queues are scoped
//! to one [`HttpJsonFetcher`] rather than the process.
//!
//! A loaded [`cartosift_core::Catalog`] is never modified afterwards; reload
//! the file to pick up changes.

#![forbid(unsafe_code)]

pub mod catalog_file;
pub mod http;

pub use catalog_file::{CatalogFileError, load_catalog};
pub use http::{DEFAULT_USER_AGENT, FetcherBuildError, HttpJsonFetcher, HttpJsonFetcherConfig};
