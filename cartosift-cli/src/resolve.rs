//! Resolve command: turn an element identifier into a centred feature.

use std::io::Write;

use cartosift_core::{CenterCache, EntityRef, decode};
use cartosift_engine::{FeatureResolver, ServiceEndpoints};
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::output::{FetcherBuilder, HttpSettings, block_on, service_endpoints, write_json};
use crate::{
    ARG_ID, ARG_OSM_API_BASE, ARG_OVERPASS_URL, ARG_TIMEOUT_SECS, ARG_USER_AGENT, CliError,
    ENV_RESOLVE_ID,
};

/// CLI arguments for the `resolve` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Fetch one element from the OpenStreetMap API, resolve its \
                 geometry and centre, and print the feature as JSON. Ways and \
                 relations without inline geometry are centred through an \
                 Overpass query.",
    about = "Resolve an element identifier such as w51050330"
)]
#[ortho_config(prefix = "CARTOSIFT")]
pub(crate) struct ResolveArgs {
    /// Element identifier: `n`, `w` or `r` followed by the numeric id.
    #[arg(value_name = "id")]
    #[serde(default)]
    pub(crate) id: Option<String>,
    /// Base URL of the OpenStreetMap API.
    #[arg(long = ARG_OSM_API_BASE, value_name = "url")]
    #[serde(default)]
    pub(crate) osm_api_base: Option<String>,
    /// Overpass interpreter URL used for centre queries.
    #[arg(long = ARG_OVERPASS_URL, value_name = "url")]
    #[serde(default)]
    pub(crate) overpass_url: Option<String>,
    /// Request timeout in seconds.
    #[arg(long = ARG_TIMEOUT_SECS, value_name = "seconds")]
    #[serde(default)]
    pub(crate) timeout_secs: Option<u64>,
    /// User agent sent with every request.
    #[arg(long = ARG_USER_AGENT, value_name = "agent")]
    #[serde(default)]
    pub(crate) user_agent: Option<String>,
}

impl ResolveArgs {
    pub(crate) fn into_config(self) -> Result<ResolveConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        ResolveConfig::try_from(merged)
    }
}

/// Resolved `resolve` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolveConfig {
    pub(crate) entity: EntityRef,
    pub(crate) endpoints: ServiceEndpoints,
    pub(crate) http: HttpSettings,
}

impl TryFrom<ResolveArgs> for ResolveConfig {
    type Error = CliError;

    fn try_from(args: ResolveArgs) -> Result<Self, Self::Error> {
        let id = args.id.ok_or(CliError::MissingArgument {
            field: ARG_ID,
            env: ENV_RESOLVE_ID,
        })?;
        let entity = decode(&id).map_err(|source| CliError::InvalidIdentifier {
            input: id.clone(),
            source,
        })?;
        let endpoints = service_endpoints(args.osm_api_base, args.overpass_url, None)?;
        Ok(Self {
            entity,
            endpoints,
            http: HttpSettings::from_overrides(args.timeout_secs, args.user_agent),
        })
    }
}

pub(crate) fn run_resolve_with(
    args: ResolveArgs,
    builder: &dyn FetcherBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let fetcher = builder.build(&config.http)?;
    let resolver =
        FeatureResolver::new(fetcher, CenterCache::new()).with_endpoints(config.endpoints);
    let resolved = block_on(resolver.resolve_feature(config.entity))??;
    info!("resolved {}", resolved.entity);
    write_json(writer, &resolved.feature)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<ResolveConfig, CliError> {
    let merged = ResolveArgs::merge_from_layers(layers).map_err(CliError::from)?;
    ResolveConfig::try_from(merged)
}
