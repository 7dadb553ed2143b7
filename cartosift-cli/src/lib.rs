//! Command-line interface for the Cartosift engine.
//!
//! Every subcommand prints its result as pretty JSON on standard output.
//! Options layer CLI flags over `CARTOSIFT_CMDS_*` environment variables and
//! configuration files.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod area;
mod categories;
mod error;
mod output;
mod resolve;
mod search;

pub use error::CliError;

use area::AreaArgs;
use categories::CategoriesArgs;
use output::{DefaultFetcherBuilder, FetcherBuilder};
use resolve::ResolveArgs;
use search::SearchArgs;

pub(crate) const ARG_ID: &str = "id";
pub(crate) const ARG_QUERY: &str = "query";
pub(crate) const ARG_CATALOG: &str = "catalog";
pub(crate) const ARG_CATEGORY: &str = "category";
pub(crate) const ARG_BBOX: &str = "bbox";
pub(crate) const ARG_OSM_API_BASE: &str = "osm-api-base";
pub(crate) const ARG_OVERPASS_URL: &str = "overpass-url";
pub(crate) const ARG_PHOTON_URL: &str = "photon-url";
pub(crate) const ARG_TIMEOUT_SECS: &str = "timeout-secs";
pub(crate) const ARG_USER_AGENT: &str = "user-agent";
pub(crate) const ARG_ZOOM: &str = "zoom";
pub(crate) const ARG_LAT: &str = "lat";
pub(crate) const ARG_LON: &str = "lon";
pub(crate) const ENV_RESOLVE_ID: &str = "CARTOSIFT_CMDS_RESOLVE_ID";
pub(crate) const ENV_SEARCH_QUERY: &str = "CARTOSIFT_CMDS_SEARCH_QUERY";
pub(crate) const ENV_CATEGORIES_CATALOG: &str = "CARTOSIFT_CMDS_CATEGORIES_CATALOG";
pub(crate) const ENV_AREA_CATALOG: &str = "CARTOSIFT_CMDS_AREA_CATALOG";
pub(crate) const ENV_AREA_CATEGORY: &str = "CARTOSIFT_CMDS_AREA_CATEGORY";
pub(crate) const ENV_AREA_BBOX: &str = "CARTOSIFT_CMDS_AREA_BBOX";

/// Run the Cartosift CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    let mut stdout = std::io::stdout().lock();
    dispatch(cli.command, &DefaultFetcherBuilder, &mut stdout)
}

fn dispatch(
    command: Command,
    builder: &dyn FetcherBuilder,
    writer: &mut dyn std::io::Write,
) -> Result<(), CliError> {
    match command {
        Command::Resolve(args) => resolve::run_resolve_with(args, builder, writer),
        Command::Search(args) => search::run_search_with(args, builder, writer),
        Command::Categories(args) => categories::run_categories_with(args, writer),
        Command::Area(args) => area::run_area_with(args, builder, writer),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "cartosift",
    about = "Resolve map features and search places and categories",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve an element identifier into a centred feature.
    Resolve(ResolveArgs),
    /// Search categories and geocoded places for a query.
    Search(SearchArgs),
    /// List or score the category catalog.
    Categories(CategoriesArgs),
    /// Find every element of a category inside a bounding box.
    Area(AreaArgs),
}

#[cfg(test)]
mod tests;
