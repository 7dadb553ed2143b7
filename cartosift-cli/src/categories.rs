//! Categories command: list the catalog or score it against a query.

use std::io::Write;

use camino::Utf8PathBuf;
use cartosift_core::score;
use cartosift_data::load_catalog;
use clap::Parser;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};

use crate::output::write_json;
use crate::{ARG_CATALOG, CliError, ENV_CATEGORIES_CATALOG};

/// CLI arguments for the `categories` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Without a query, print every catalog entry in file order. \
                 With a query, print the entries whose name matches, the \
                 remaining matches, and the full ranking.",
    about = "List or score the category catalog"
)]
#[ortho_config(prefix = "CARTOSIFT")]
pub(crate) struct CategoriesArgs {
    /// Optional query text to score the catalog against.
    #[arg(value_name = "text")]
    #[serde(default)]
    pub(crate) query: Option<String>,
    /// JSON file holding the category catalog.
    #[arg(long = ARG_CATALOG, value_name = "path")]
    #[serde(default)]
    pub(crate) catalog: Option<Utf8PathBuf>,
}

impl CategoriesArgs {
    pub(crate) fn into_config(self) -> Result<CategoriesConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        CategoriesConfig::try_from(merged)
    }
}

/// Resolved `categories` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CategoriesConfig {
    pub(crate) catalog: Utf8PathBuf,
    pub(crate) query: Option<String>,
}

impl TryFrom<CategoriesArgs> for CategoriesConfig {
    type Error = CliError;

    fn try_from(args: CategoriesArgs) -> Result<Self, Self::Error> {
        let catalog = args.catalog.ok_or(CliError::MissingArgument {
            field: ARG_CATALOG,
            env: ENV_CATEGORIES_CATALOG,
        })?;
        Ok(Self {
            catalog,
            query: args.query.filter(|query| !query.is_empty()),
        })
    }
}

pub(crate) fn run_categories_with(
    args: CategoriesArgs,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let catalog = load_catalog(&config.catalog)?;
    match config.query {
        Some(query) => write_json(writer, &score(&catalog, &query)),
        None => write_json(writer, catalog.entries()),
    }
}
