//! Plumbing shared by the subcommands: fetcher construction, endpoint
//! overrides, the async runtime, and JSON output.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use cartosift_core::JsonFetcher;
use cartosift_data::{HttpJsonFetcher, HttpJsonFetcherConfig};
use cartosift_engine::ServiceEndpoints;
use serde::Serialize;

use crate::CliError;

/// HTTP client settings resolved from the command options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HttpSettings {
    pub(crate) timeout: Duration,
    pub(crate) user_agent: String,
}

impl HttpSettings {
    pub(crate) fn from_overrides(timeout_secs: Option<u64>, user_agent: Option<String>) -> Self {
        let defaults = HttpJsonFetcherConfig::default();
        Self {
            timeout: timeout_secs.map_or(defaults.timeout, Duration::from_secs),
            user_agent: user_agent.unwrap_or(defaults.user_agent),
        }
    }

    fn fetcher_config(&self) -> HttpJsonFetcherConfig {
        HttpJsonFetcherConfig::default()
            .with_timeout(self.timeout)
            .with_user_agent(self.user_agent.clone())
    }
}

/// Builds the fetcher used by one command invocation.
pub(crate) trait FetcherBuilder {
    fn build(&self, http: &HttpSettings) -> Result<Arc<dyn JsonFetcher>, CliError>;
}

pub(crate) struct DefaultFetcherBuilder;

impl FetcherBuilder for DefaultFetcherBuilder {
    fn build(&self, http: &HttpSettings) -> Result<Arc<dyn JsonFetcher>, CliError> {
        let fetcher = HttpJsonFetcher::with_config(http.fetcher_config())?;
        Ok(Arc::new(fetcher))
    }
}

/// Default endpoints with any overrides applied, validated.
pub(crate) fn service_endpoints(
    osm_api_base: Option<String>,
    overpass_url: Option<String>,
    photon_url: Option<String>,
) -> Result<ServiceEndpoints, CliError> {
    let mut endpoints = ServiceEndpoints::default();
    if let Some(base) = osm_api_base {
        endpoints = endpoints.with_osm_api_base(base);
    }
    if let Some(url) = overpass_url {
        endpoints = endpoints.with_overpass_url(url);
    }
    if let Some(url) = photon_url {
        endpoints = endpoints.with_photon_url(url);
    }
    endpoints.validate()?;
    Ok(endpoints)
}

/// Drive `future` to completion on a fresh current-thread runtime.
pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output, CliError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    Ok(runtime.block_on(future))
}

pub(crate) fn write_json<T: Serialize + ?Sized>(
    writer: &mut dyn Write,
    value: &T,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseOutput)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}
