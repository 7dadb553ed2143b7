//! Wire shapes returned by the primary and aggregate data sources.
//!
//! Both the OpenStreetMap API and Overpass answer with an `elements` array.
//! Only the fields needed for resolution are modelled; everything else is
//! ignored during deserialisation.

use std::collections::HashMap;

use geo::Coord;
use serde::Deserialize;

use crate::entity::{ElementKind, EntityRef};

/// Free-form OpenStreetMap tags.
pub type Tags = HashMap<String, String>;

/// A `{lat, lon}` pair as found in element payloads.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LatLon {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl LatLon {
    /// Convert to a `geo` coordinate with `x = lon`, `y = lat`.
    #[must_use]
    pub const fn to_coord(self) -> Coord<f64> {
        Coord {
            x: self.lon,
            y: self.lat,
        }
    }
}

/// A relation member.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawMember {
    /// Kind of the referenced element.
    #[serde(rename = "type")]
    pub kind: ElementKind,
    /// Id of the referenced element.
    #[serde(rename = "ref")]
    pub reference: u64,
    /// Member role, possibly empty.
    #[serde(default)]
    pub role: String,
    /// Inline geometry, present only when the query asked for it.
    /// Individual points may be `null`.
    #[serde(default)]
    pub geometry: Option<Vec<Option<LatLon>>>,
}

/// A single element of any kind.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawElement {
    /// Element kind.
    #[serde(rename = "type")]
    pub kind: ElementKind,
    /// Element id.
    pub id: u64,
    /// Latitude, present on nodes.
    #[serde(default)]
    pub lat: Option<f64>,
    /// Longitude, present on nodes.
    #[serde(default)]
    pub lon: Option<f64>,
    /// Ordered node references, present on ways.
    #[serde(default)]
    pub nodes: Option<Vec<u64>>,
    /// Members, present on relations.
    #[serde(default)]
    pub members: Option<Vec<RawMember>>,
    /// Element tags; missing tags deserialise as empty.
    #[serde(default)]
    pub tags: Tags,
}

impl RawElement {
    /// Identifier of this element.
    #[must_use]
    pub const fn entity(&self) -> EntityRef {
        EntityRef::new(self.kind, self.id)
    }

    /// Node position, if both coordinates are present.
    #[must_use]
    pub fn position(&self) -> Option<Coord<f64>> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Some(LatLon { lat, lon }.to_coord()),
            _ => None,
        }
    }
}

/// Response body of a primary entity fetch or an Overpass body query.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ElementsResponse {
    /// Flattened elements.
    #[serde(default)]
    pub elements: Vec<RawElement>,
}

/// One entry of an aggregate `out center` response.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct CenterElement {
    /// Bounding-box centre computed by the aggregate service.
    #[serde(default)]
    pub center: Option<LatLon>,
}

/// Response body of an aggregate centre query.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CenterResponse {
    /// Matching elements; only the first is consulted.
    #[serde(default)]
    pub elements: Vec<CenterElement>,
}

impl CenterResponse {
    /// Centre of the first element, if the service reported one.
    #[must_use]
    pub fn first_center(&self) -> Option<Coord<f64>> {
        self.elements
            .first()
            .and_then(|element| element.center)
            .map(LatLon::to_coord)
    }
}
