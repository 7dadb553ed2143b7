//! Area search: every element inside a bounding box carrying a tag set.

use cartosift_core::{
    Classifier, ElementsResponse, Feature, FetchOptions, JsonFetcher, TagClassifier, decode_body,
    resolve_elements,
};
use geo::Rect;
use log::debug;
use serde::Serialize;

use crate::endpoints::ServiceEndpoints;
use crate::error::RemoteError;

/// A feature ready for display on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapFeature {
    /// Numeric map id (see [`cartosift_core::EntityRef::to_map_id`]).
    pub id: u64,
    /// The resolved feature.
    #[serde(flatten)]
    pub feature: Feature,
}

/// Runs Overpass union queries and resolves their geometry.
#[derive(Debug)]
pub struct OverpassSearch<F, C = TagClassifier> {
    fetcher: F,
    classifier: C,
    endpoints: ServiceEndpoints,
}

impl<F: JsonFetcher> OverpassSearch<F> {
    /// Create a search using the default classifier.
    pub const fn new(fetcher: F, endpoints: ServiceEndpoints) -> Self {
        Self {
            fetcher,
            classifier: TagClassifier,
            endpoints,
        }
    }
}

impl<F, C> OverpassSearch<F, C>
where
    F: JsonFetcher,
    C: Classifier,
{
    /// Replace the classifier.
    pub fn with_classifier<D: Classifier>(self, classifier: D) -> OverpassSearch<F, D> {
        OverpassSearch {
            fetcher: self.fetcher,
            classifier,
            endpoints: self.endpoints,
        }
    }

    /// Find tagged elements inside `bbox` matching every `(key, value)` pair;
    /// a value of `*` matches any value.
    ///
    /// Untagged elements, such as the nodes returned only to build way
    /// geometry, and elements without a centre are left out.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError`] when the request cannot be built, fails, or
    /// its response is malformed.
    pub async fn search<'a, I>(
        &self,
        bbox: Rect<f64>,
        tags: I,
    ) -> Result<Vec<MapFeature>, RemoteError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let query = self.endpoints.area_query(bbox, tags);
        let url = self.endpoints.overpass_query_url(&query)?;
        debug!("area search: {query}");
        let body = self
            .fetcher
            .fetch_json(url.as_str(), &FetchOptions::default())
            .await?;
        let response: ElementsResponse = decode_body(url.as_str(), body)?;
        let features: Vec<MapFeature> = resolve_elements(&response.elements, &self.classifier)
            .into_iter()
            .filter(|feature| feature.center.is_some() && !feature.tags.is_empty())
            .filter_map(|feature| {
                let id = feature.entity.to_map_id()?;
                Some(MapFeature { id, feature })
            })
            .collect();
        debug!("area search returned {} features", features.len());
        Ok(features)
    }
}
