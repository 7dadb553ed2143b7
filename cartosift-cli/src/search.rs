//! Search command: one merged lookup across the catalog and the geocoder.

use std::io::Write;
use std::sync::Arc;

use camino::Utf8PathBuf;
use cartosift_core::Catalog;
use cartosift_data::load_catalog;
use cartosift_engine::{SearchSession, ServiceEndpoints, Viewport};
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::output::{FetcherBuilder, HttpSettings, block_on, service_endpoints, write_json};
use crate::{
    ARG_CATALOG, ARG_LAT, ARG_LON, ARG_PHOTON_URL, ARG_QUERY, ARG_TIMEOUT_SECS, ARG_USER_AGENT,
    ARG_ZOOM, CliError, ENV_SEARCH_QUERY,
};

/// CLI arguments for the `search` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Score the query against the category catalog and ask the \
                 geocoder for matching places near the given map position. \
                 Categories whose name matches come first, then places, then \
                 the remaining categories.",
    about = "Search categories and places"
)]
#[ortho_config(prefix = "CARTOSIFT")]
pub(crate) struct SearchArgs {
    /// Query text.
    #[arg(value_name = "text")]
    #[serde(default)]
    pub(crate) query: Option<String>,
    /// JSON file holding the category catalog.
    #[arg(long = ARG_CATALOG, value_name = "path")]
    #[serde(default)]
    pub(crate) catalog: Option<Utf8PathBuf>,
    /// Geocoder search endpoint.
    #[arg(long = ARG_PHOTON_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) photon_url: Option<String>,
    /// Map zoom level biasing the geocoder.
    #[arg(long = ARG_ZOOM, value_name = "level")]
    #[serde(default)]
    pub(crate) zoom: Option<f64>,
    /// Latitude of the map centre.
    #[arg(long = ARG_LAT, value_name = "degrees", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) lat: Option<f64>,
    /// Longitude of the map centre.
    #[arg(long = ARG_LON, value_name = "degrees", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) lon: Option<f64>,
    /// Request timeout in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// User agent sent with every request.
    #[arg(long = ARG_USER_AGENT, value_name = "agent")]
    #[serde(default)]
    pub(crate) user_agent: Option<String>,
}

impl SearchArgs {
    pub(crate) fn into_config(self) -> Result<SearchConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        SearchConfig::try_from(merged)
    }
}

/// Resolved `search` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SearchConfig {
    pub(crate) query: String,
    pub(crate) catalog: Option<Utf8PathBuf>,
    pub(crate) viewport: Viewport,
    pub(crate) endpoints: ServiceEndpoints,
    pub(crate) http: HttpSettings,
}

impl TryFrom<SearchArgs> for SearchConfig {
    type Error = CliError;

    fn try_from(args: SearchArgs) -> Result<Self, Self::Error> {
        let query = args.query.ok_or(CliError::MissingArgument {
            field: ARG_QUERY,
            env: ENV_SEARCH_QUERY,
        })?;
        let defaults = Viewport::default();
        let viewport = Viewport::new(
            args.zoom.unwrap_or(defaults.zoom),
            args.lat.unwrap_or(defaults.lat),
            args.lon.unwrap_or(defaults.lon),
        );
        Ok(Self {
            query,
            catalog: args.catalog,
            viewport,
            endpoints: service_endpoints(None, None, args.photon_url)?,
            http: HttpSettings::from_overrides(args.timeout_secs, args.user_agent),
        })
    }
}

pub(crate) fn run_search_with(
    args: SearchArgs,
    builder: &dyn FetcherBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let catalog = match &config.catalog {
        Some(path) => load_catalog(path)?,
        None => Catalog::default(),
    };
    let fetcher = builder.build(&config.http)?;
    let session = SearchSession::new(fetcher, Arc::new(catalog), config.endpoints);
    let options = block_on(session.search_once(&config.query, config.viewport))?;
    write_json(writer, &options)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<SearchConfig, CliError> {
    let merged = SearchArgs::merge_from_layers(layers).map_err(CliError::from)?;
    SearchConfig::try_from(merged)
}
