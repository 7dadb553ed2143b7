//! Load the static category catalog from a JSON file on disk.

use std::io::{self, BufReader};

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8};
use cartosift_core::{Catalog, CatalogError};
use log::debug;
use thiserror::Error;

/// Errors raised while loading a catalog file.
#[derive(Debug, Error)]
pub enum CatalogFileError {
    /// The file could not be opened.
    #[error("failed to open category catalog {path}")]
    Open {
        /// Location of the catalog file.
        path: Utf8PathBuf,
        /// Source error from the filesystem.
        #[source]
        source: io::Error,
    },
    /// The file contents were not a valid catalog.
    #[error("invalid category catalog {path}")]
    Parse {
        /// Location of the catalog file.
        path: Utf8PathBuf,
        /// Source error from catalog validation.
        #[source]
        source: CatalogError,
    },
}

/// Read and validate the catalog stored at `path`.
///
/// The file holds a JSON array of category entries.
///
/// # Errors
///
/// Returns [`CatalogFileError::Open`] when the file cannot be opened and
/// [`CatalogFileError::Parse`] when its contents are malformed or repeat a
/// key.
pub fn load_catalog(path: &Utf8Path) -> Result<Catalog, CatalogFileError> {
    let file = fs_utf8::File::open_ambient(path, ambient_authority()).map_err(|source| {
        CatalogFileError::Open {
            path: path.to_path_buf(),
            source,
        }
    })?;
    let catalog =
        Catalog::from_reader(BufReader::new(file)).map_err(|source| CatalogFileError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("loaded {} categories from {path}", catalog.len());
    Ok(catalog)
}
