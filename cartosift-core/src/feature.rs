//! Resolved features and their classification.

use std::collections::BTreeMap;

use geo::Coord;
use serde::Serialize;
use serde::ser::{SerializeTuple, Serializer};

use crate::element::Tags;
use crate::entity::EntityRef;
use crate::geometry::FeatureGeometry;

/// Coarse category derived from an element's tags.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Classification {
    /// Icon or style class, e.g. `amenity`.
    pub class: String,
    /// Refinement within the class, e.g. `restaurant`.
    pub subclass: String,
}

/// Derive a [`Classification`] from tags.
///
/// Implementations must be pure: the same tags always classify the same way.
pub trait Classifier {
    /// Classify an element by its tags.
    fn classify(&self, tags: &Tags) -> Classification;
}

/// Keys consulted by [`TagClassifier`], in priority order.
const CLASS_KEYS: &[&str] = &[
    "amenity",
    "shop",
    "tourism",
    "leisure",
    "historic",
    "office",
    "craft",
    "sport",
    "public_transport",
    "railway",
    "aeroway",
    "highway",
    "waterway",
    "natural",
    "man_made",
    "place",
    "landuse",
    "building",
    "boundary",
];

/// Classifier picking the first well-known key present in the tags.
///
/// Elements carrying none of the known keys classify as `unknown`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TagClassifier;

impl Classifier for TagClassifier {
    fn classify(&self, tags: &Tags) -> Classification {
        CLASS_KEYS
            .iter()
            .find_map(|key| {
                tags.get(*key).map(|value| Classification {
                    class: (*key).to_owned(),
                    subclass: value.clone(),
                })
            })
            .unwrap_or_else(|| Classification {
                class: "unknown".to_owned(),
                subclass: String::new(),
            })
    }
}

/// A fully resolved map feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Feature {
    /// Element the feature was built from.
    pub entity: EntityRef,
    /// Raw tags.
    pub tags: Tags,
    /// Classification derived from `tags`.
    pub classification: Classification,
    /// Classification merged with tags; tags win on key collisions.
    pub properties: BTreeMap<String, String>,
    /// Geometry, absent for unrecognised element kinds.
    pub geometry: Option<FeatureGeometry>,
    /// Representative coordinate (`x = lon`, `y = lat`).
    #[serde(serialize_with = "serialize_center")]
    pub center: Option<Coord<f64>>,
}

impl Feature {
    /// Build a feature, deriving classification and properties from `tags`.
    pub fn new(
        entity: EntityRef,
        tags: Tags,
        geometry: Option<FeatureGeometry>,
        classifier: &dyn Classifier,
    ) -> Self {
        let classification = classifier.classify(&tags);
        let mut properties = BTreeMap::new();
        properties.insert("class".to_owned(), classification.class.clone());
        properties.insert("subclass".to_owned(), classification.subclass.clone());
        properties.extend(tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        let center = geometry.as_ref().and_then(FeatureGeometry::center);
        Self {
            entity,
            tags,
            classification,
            properties,
            geometry,
            center,
        }
    }

    /// Centre as a `[lon, lat]` pair.
    #[must_use]
    pub fn center_lon_lat(&self) -> Option<[f64; 2]> {
        self.center.map(|c| [c.x, c.y])
    }
}

fn serialize_center<S: Serializer>(
    center: &Option<Coord<f64>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match center {
        Some(coord) => {
            let mut pair = serializer.serialize_tuple(2)?;
            pair.serialize_element(&coord.x)?;
            pair.serialize_element(&coord.y)?;
            pair.end()
        }
        None => serializer.serialize_none(),
    }
}
