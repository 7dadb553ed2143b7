//! Area command: every element of one catalog category inside a bounding box.

use std::io::Write;

use camino::Utf8PathBuf;
use cartosift_data::load_catalog;
use cartosift_engine::{MapFeature, OverpassSearch, ServiceEndpoints};
use clap::Parser;
use geo::{Coord, Rect};
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::output::{FetcherBuilder, HttpSettings, block_on, service_endpoints, write_json};
use crate::{
    ARG_BBOX, ARG_CATALOG, ARG_CATEGORY, ARG_OVERPASS_URL, ARG_TIMEOUT_SECS, ARG_USER_AGENT,
    CliError, ENV_AREA_BBOX, ENV_AREA_CATALOG, ENV_AREA_CATEGORY,
};

/// CLI arguments for the `area` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Look up a category in the catalog and query Overpass for \
                 every node, way and relation inside the bounding box that \
                 carries the category's tags. Results are printed as a \
                 feature collection.",
    about = "Find a category's elements inside a bounding box"
)]
#[ortho_config(prefix = "CARTOSIFT")]
pub(crate) struct AreaArgs {
    /// Category key, such as `amenity/cafe`.
    #[arg(value_name = "category")]
    #[serde(default)]
    pub(crate) category: Option<String>,
    /// Bounding box as `west,south,east,north` in degrees.
    #[arg(long = ARG_BBOX, value_name = "west,south,east,north", allow_hyphen_values = true)]
    #[serde(default)]
    pub(crate) bbox: Option<String>,
    /// JSON file holding the category catalog.
    #[arg(long = ARG_CATALOG, value_name = "path")]
    #[serde(default)]
    pub(crate) catalog: Option<Utf8PathBuf>,
    /// Overpass interpreter URL.
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

impl AreaArgs {
    pub(crate) fn into_config(self) -> Result<AreaConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        AreaConfig::try_from(merged)
    }
}

/// Resolved `area` command configuration.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AreaConfig {
    pub(crate) category: String,
    pub(crate) bbox: Rect<f64>,
    pub(crate) catalog: Utf8PathBuf,
    pub(crate) endpoints: ServiceEndpoints,
    pub(crate) http: HttpSettings,
}

impl TryFrom<AreaArgs> for AreaConfig {
    type Error = CliError;

    fn try_from(args: AreaArgs) -> Result<Self, Self::Error> {
        let category = args.category.ok_or(CliError::MissingArgument {
            field: ARG_CATEGORY,
            env: ENV_AREA_CATEGORY,
        })?;
        let bbox = args.bbox.ok_or(CliError::MissingArgument {
            field: ARG_BBOX,
            env: ENV_AREA_BBOX,
        })?;
        let catalog = args.catalog.ok_or(CliError::MissingArgument {
            field: ARG_CATALOG,
            env: ENV_AREA_CATALOG,
        })?;
        Ok(Self {
            category,
            bbox: parse_bbox(&bbox)?,
            catalog,
            endpoints: service_endpoints(None, args.overpass_url, None)?,
            http: HttpSettings::from_overrides(args.timeout_secs, args.user_agent),
        })
    }
}

/// Parse `west,south,east,north` into a rectangle with `x = lon`, `y = lat`.
pub(crate) fn parse_bbox(input: &str) -> Result<Rect<f64>, CliError> {
    let invalid = || CliError::InvalidBoundingBox {
        input: input.to_owned(),
    };
    let values = input
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| invalid())?;
    let [west, south, east, north] = <[f64; 4]>::try_from(values).map_err(|_| invalid())?;
    if [west, south, east, north].iter().any(|value| !value.is_finite())
        || west >= east
        || south >= north
    {
        return Err(invalid());
    }
    Ok(Rect::new(
        Coord { x: west, y: south },
        Coord { x: east, y: north },
    ))
}

pub(crate) fn run_area_with(
    args: AreaArgs,
    builder: &dyn FetcherBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let catalog = load_catalog(&config.catalog)?;
    let entry = catalog
        .get(&config.category)
        .ok_or_else(|| CliError::UnknownCategory {
            key: config.category.clone(),
        })?;
    let fetcher = builder.build(&config.http)?;
    let search = OverpassSearch::new(fetcher, config.endpoints);
    let tags = entry
        .tags
        .iter()
        .map(|(key, value)| (key.as_str(), value.as_str()));
    let features = block_on(search.search(config.bbox, tags))??;
    info!(
        "found {} {} elements in the area",
        features.len(),
        entry.display_name()
    );
    write_json(writer, &FeatureCollection::new(&features))
}

#[derive(Debug, Serialize)]
struct FeatureCollection<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    features: &'a [MapFeature],
}

impl<'a> FeatureCollection<'a> {
    const fn new(features: &'a [MapFeature]) -> Self {
        Self {
            kind: "FeatureCollection",
            features,
        }
    }
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<AreaConfig, CliError> {
    let merged = AreaArgs::merge_from_layers(layers).map_err(CliError::from)?;
    AreaConfig::try_from(merged)
}
