//! Error types emitted by the Cartosift CLI.
//!
//! Keep this error type reasonably small, as every command returns
//! `Result<_, CliError>` and the workspace enables `clippy::result_large_err`.

use std::sync::Arc;

use cartosift_core::IdentifierError;
use cartosift_data::{CatalogFileError, FetcherBuildError};
use cartosift_engine::{EndpointError, RemoteError, ResolveError};
use thiserror::Error;

/// Errors emitted by the Cartosift CLI.
#[derive(Debug, Error)]
pub enum CliError {
    /// Provided arguments failed Clap validation.
    #[error(transparent)]
    ArgumentParsing(#[from] clap::Error),
    /// Configuration layering failed (files, env, CLI).
    #[error("failed to load configuration: {0}")]
    Configuration(#[from] Arc<ortho_config::OrthoError>),
    /// A required option is missing after configuration merging.
    #[error("missing {field} (set --{field} or {env})")]
    MissingArgument {
        /// Name of the missing option.
        field: &'static str,
        /// Environment variable that can supply it.
        env: &'static str,
    },
    /// The element identifier could not be decoded.
    #[error("invalid element identifier {input:?}: {source}")]
    InvalidIdentifier {
        /// Identifier as given.
        input: String,
        /// Decoding failure.
        #[source]
        source: IdentifierError,
    },
    /// The bounding box is not four finite, ordered coordinates.
    #[error("invalid bounding box {input:?} (expected west,south,east,north)")]
    InvalidBoundingBox {
        /// Bounding box as given.
        input: String,
    },
    /// A service endpoint override is not a valid URL.
    #[error(transparent)]
    InvalidEndpoint(#[from] EndpointError),
    /// Loading the category catalog failed.
    #[error(transparent)]
    LoadCatalog(#[from] CatalogFileError),
    /// The requested category is not in the catalog.
    #[error("category {key:?} is not in the catalog")]
    UnknownCategory {
        /// Requested category key.
        key: String,
    },
    /// Constructing the HTTP fetcher failed.
    #[error(transparent)]
    BuildFetcher(#[from] FetcherBuildError),
    /// Starting the async runtime failed.
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] std::io::Error),
    /// Feature resolution failed.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    /// The area search failed.
    #[error("area search failed: {0}")]
    AreaSearch(#[from] RemoteError),
    /// Serialising command output failed.
    #[error("failed to serialise output: {0}")]
    SerialiseOutput(#[source] serde_json::Error),
    /// Writing command output failed.
    #[error("failed to write output: {0}")]
    WriteOutput(#[source] std::io::Error),
}
