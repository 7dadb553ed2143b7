//! Base URLs of the backing services and the request URLs derived from them.

use cartosift_core::{EntityRef, IdentifierError};
use geo::Rect;
use url::Url;

use crate::error::EndpointError;

/// Default base of the OpenStreetMap editing API.
pub const DEFAULT_OSM_API_BASE: &str = "https://api.openstreetmap.org/api/0.6/";
/// Default Overpass interpreter endpoint.
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";
/// Default Photon geocoder endpoint.
pub const DEFAULT_PHOTON_URL: &str = "https://photon.komoot.io/api/";
/// Default server-side timeout requested from Overpass, in seconds.
pub const DEFAULT_OVERPASS_TIMEOUT_SECS: u32 = 25;
/// Highest zoom level accepted by the geocoder.
pub const MAX_GEOCODER_ZOOM: u8 = 16;

/// Map position biasing geocoder results.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Map zoom level; fractional values are rounded.
    pub zoom: f64,
    /// Latitude of the map centre.
    pub lat: f64,
    /// Longitude of the map centre.
    pub lon: f64,
}

impl Viewport {
    /// Create a viewport.
    #[must_use]
    pub const fn new(zoom: f64, lat: f64, lon: f64) -> Self {
        Self { zoom, lat, lon }
    }

    /// Zoom rounded to the nearest level and clamped to `0..=16`.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "level is rounded and clamped to 0..=16; NaN saturates to 0"
    )]
    pub fn geocoder_zoom(&self) -> u8 {
        self.zoom.round().clamp(0.0, f64::from(MAX_GEOCODER_ZOOM)) as u8
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// Service locations used by the resolver and the search components.
///
/// # Examples
///
/// ```
/// use cartosift_core::EntityRef;
/// use cartosift_engine::ServiceEndpoints;
///
/// let endpoints = ServiceEndpoints::default();
/// let url = endpoints.element_url(EntityRef::way(51050330))?;
/// assert_eq!(
///     url.as_str(),
///     "https://api.openstreetmap.org/api/0.6/way/51050330.json"
/// );
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoints {
    /// Base of the editing API serving `/{kind}/{id}.json`.
    pub osm_api_base: String,
    /// Overpass interpreter accepting a `data` query parameter.
    pub overpass_url: String,
    /// Photon geocoder search endpoint.
    pub photon_url: String,
    /// Server-side timeout written into Overpass queries.
    pub overpass_timeout_secs: u32,
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            osm_api_base: DEFAULT_OSM_API_BASE.to_owned(),
            overpass_url: DEFAULT_OVERPASS_URL.to_owned(),
            photon_url: DEFAULT_PHOTON_URL.to_owned(),
            overpass_timeout_secs: DEFAULT_OVERPASS_TIMEOUT_SECS,
        }
    }
}

impl ServiceEndpoints {
    /// Replace the editing API base.
    #[must_use]
    pub fn with_osm_api_base(mut self, base: impl Into<String>) -> Self {
        self.osm_api_base = base.into();
        self
    }

    /// Replace the Overpass endpoint.
    #[must_use]
    pub fn with_overpass_url(mut self, url: impl Into<String>) -> Self {
        self.overpass_url = url.into();
        self
    }

    /// Replace the geocoder endpoint.
    #[must_use]
    pub fn with_photon_url(mut self, url: impl Into<String>) -> Self {
        self.photon_url = url.into();
        self
    }

    /// Check that every configured URL parses.
    ///
    /// # Errors
    ///
    /// Returns the first [`EndpointError`] encountered.
    pub fn validate(&self) -> Result<(), EndpointError> {
        for url in [&self.osm_api_base, &self.overpass_url, &self.photon_url] {
            parse(url)?;
        }
        Ok(())
    }

    /// URL of the primary fetch for `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError`] when the API base is not a valid URL.
    pub fn element_url(&self, entity: EntityRef) -> Result<Url, EndpointError> {
        let mut base = self.osm_api_base.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let path = format!("{}.json", entity.api_path());
        parse(&base)?.join(&path).map_err(|source| EndpointError {
            url: self.osm_api_base.clone(),
            source,
        })
    }

    /// Overpass query asking only for the centre of `entity`.
    ///
    /// # Errors
    ///
    /// Returns [`IdentifierError::UnsupportedKind`] for unknown kinds.
    pub fn center_query(&self, entity: EntityRef) -> Result<String, IdentifierError> {
        entity.to_aggregate_query_type()?;
        Ok(format!(
            "[out:json][timeout:{}];{}({});out center;",
            self.overpass_timeout_secs, entity.kind, entity.id
        ))
    }

    /// Overpass URL carrying `query` as its `data` parameter.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError`] when the Overpass URL is invalid.
    pub fn overpass_query_url(&self, query: &str) -> Result<Url, EndpointError> {
        let mut url = parse(&self.overpass_url)?;
        url.query_pairs_mut().append_pair("data", query);
        Ok(url)
    }

    /// Overpass union query for all elements in `bbox` carrying `tags`.
    ///
    /// A tag value of `*` matches any value of that key.
    #[must_use]
    pub fn area_query<'a, I>(&self, bbox: Rect<f64>, tags: I) -> String
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let filter: String = tags
            .into_iter()
            .map(|(key, value)| {
                if value == "*" {
                    format!("[\"{key}\"]")
                } else {
                    format!("[\"{key}\"=\"{value}\"]")
                }
            })
            .collect();
        let (min, max) = (bbox.min(), bbox.max());
        let area = format!("{},{},{},{}", min.y, min.x, max.y, max.x);
        format!(
            "[out:json][timeout:{}];(node{filter}({area});way{filter}({area});\
             relation{filter}({area}););out body;>;out skel qt;",
            self.overpass_timeout_secs
        )
    }

    /// Geocoder URL for `text` biased towards `viewport`.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError`] when the geocoder URL is invalid.
    pub fn geocoder_url(&self, text: &str, viewport: Viewport) -> Result<Url, EndpointError> {
        let mut url = parse(&self.photon_url)?;
        url.query_pairs_mut()
            .append_pair("q", text)
            .append_pair("lon", &viewport.lon.to_string())
            .append_pair("lat", &viewport.lat.to_string())
            .append_pair("zoom", &viewport.geocoder_zoom().to_string());
        Ok(url)
    }
}

fn parse(url: &str) -> Result<Url, EndpointError> {
    Url::parse(url).map_err(|source| EndpointError {
        url: url.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;
    use rstest::rstest;

    #[rstest]
    #[case("https://osm.test/api/0.6/")]
    #[case("https://osm.test/api/0.6")]
    fn element_url_tolerates_missing_slash(#[case] base: &str) {
        let endpoints = ServiceEndpoints::default().with_osm_api_base(base);
        let url = endpoints
            .element_url(EntityRef::relation(7))
            .expect("valid url");
        assert_eq!(url.as_str(), "https://osm.test/api/0.6/relation/7.json");
    }

    #[rstest]
    fn center_query_names_the_element() {
        let query = ServiceEndpoints::default()
            .center_query(EntityRef::way(51_050_330))
            .expect("supported kind");
        assert_eq!(query, "[out:json][timeout:25];way(51050330);out center;");
    }

    #[rstest]
    fn center_query_rejects_unknown_kinds() {
        let entity = EntityRef::new(cartosift_core::ElementKind::Unknown, 1);
        assert!(matches!(
            ServiceEndpoints::default().center_query(entity),
            Err(IdentifierError::UnsupportedKind { .. })
        ));
    }

    #[rstest]
    fn overpass_query_is_form_encoded() {
        let url = ServiceEndpoints::default()
            .overpass_query_url("node(1);out center;")
            .expect("valid url");
        assert_eq!(
            url.as_str(),
            "https://overpass-api.de/api/interpreter?data=node%281%29%3Bout+center%3B"
        );
    }

    #[rstest]
    fn area_query_orders_bbox_south_west_north_east() {
        let bbox = Rect::new(Coord { x: 14.25, y: 50.0 }, Coord { x: 14.5, y: 50.125 });
        let query = ServiceEndpoints::default()
            .area_query(bbox, [("amenity", "cafe"), ("wheelchair", "*")]);
        assert_eq!(
            query,
            "[out:json][timeout:25];(\
             node[\"amenity\"=\"cafe\"][\"wheelchair\"](50,14.25,50.125,14.5);\
             way[\"amenity\"=\"cafe\"][\"wheelchair\"](50,14.25,50.125,14.5);\
             relation[\"amenity\"=\"cafe\"][\"wheelchair\"](50,14.25,50.125,14.5);\
             );out body;>;out skel qt;"
        );
    }

    #[rstest]
    #[case(12.4, 12)]
    #[case(12.5, 13)]
    #[case(-3.0, 0)]
    #[case(19.0, 16)]
    #[case(f64::NAN, 0)]
    fn geocoder_zoom_is_rounded_and_clamped(#[case] zoom: f64, #[case] expected: u8) {
        assert_eq!(Viewport::new(zoom, 0.0, 0.0).geocoder_zoom(), expected);
    }

    #[rstest]
    fn geocoder_url_carries_query_and_bias() {
        let url = ServiceEndpoints::default()
            .geocoder_url("café bar", Viewport::new(15.7, 50.08, 14.42))
            .expect("valid url");
        assert_eq!(
            url.as_str(),
            "https://photon.komoot.io/api/?q=caf%C3%A9+bar&lon=14.42&lat=50.08&zoom=16"
        );
    }

    #[rstest]
    fn validate_reports_bad_urls() {
        let endpoints = ServiceEndpoints::default().with_photon_url("not a url");
        let err = endpoints.validate().expect_err("invalid url");
        assert_eq!(err.url, "not a url");
    }
}
