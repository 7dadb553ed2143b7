//! Test helpers: a scripted fetcher builder, catalog files, and command
//! execution against an in-memory writer.

use super::*;
use crate::output::HttpSettings;
use camino::{Utf8Path, Utf8PathBuf};
use cartosift_core::JsonFetcher;
use cartosift_core::test_support::StubFetcher;
use std::cell::RefCell;
use std::sync::Arc;

pub(super) const CATALOG_JSON: &str = r#"[
    {"key": "amenity/restaurant", "name": "Restaurant",
     "tags": {"amenity": "restaurant"}, "terms": ["dining"]},
    {"key": "amenity/fast_food", "name": "Fast Food",
     "tags": {"amenity": "fast_food"}, "terms": ["restaurant"]},
    {"key": "amenity/cafe", "name": "Cafe", "tags": {"amenity": "cafe"}}
]"#;

pub(super) const OSM_API: &str = "http://osm.test/api/0.6/";
pub(super) const OVERPASS: &str = "http://overpass.test/api/interpreter";
pub(super) const PHOTON: &str = "http://photon.test/api/";

/// Hands out one shared [`StubFetcher`] and records the settings it saw.
pub(super) struct StubFetcherBuilder {
    pub(super) fetcher: Arc<StubFetcher>,
    pub(super) settings: RefCell<Option<HttpSettings>>,
}

impl StubFetcherBuilder {
    pub(super) fn new(fetcher: StubFetcher) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            settings: RefCell::new(None),
        }
    }
}

impl FetcherBuilder for StubFetcherBuilder {
    fn build(&self, http: &HttpSettings) -> Result<Arc<dyn JsonFetcher>, CliError> {
        self.settings.replace(Some(http.clone()));
        let fetcher: Arc<dyn JsonFetcher> = self.fetcher.clone();
        Ok(fetcher)
    }
}

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path.as_std_path(), contents).expect("write test file");
}

pub(super) fn utf8_root(dir: &tempfile::TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace")
}

/// Parse `argv` and dispatch it, returning the outcome and the printed text.
pub(super) fn run_command(
    argv: &[String],
    builder: &dyn FetcherBuilder,
) -> (Result<(), CliError>, String) {
    let mut stdout = Vec::new();
    let outcome = Cli::try_parse_from(argv)
        .map_err(CliError::from)
        .and_then(|cli| dispatch(cli.command, builder, &mut stdout));
    let text = String::from_utf8(stdout).expect("stdout utf-8");
    (outcome, text)
}
