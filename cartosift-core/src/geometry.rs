//! Resolve flat element collections into typed feature geometry.
//!
//! Resolution never fails: upstream data is user-contributed and frequently
//! incomplete, so missing node references are dropped and unknown element
//! kinds yield features without geometry.

use std::collections::HashMap;

use geo::{BoundingRect, Coord, LineString, Point};
use serde::Serialize;
use serde::ser::{SerializeStruct, Serializer};

use crate::element::RawElement;
use crate::entity::ElementKind;
use crate::feature::{Classifier, Feature};

/// Geometry attached to a [`Feature`].
///
/// Relations are approximated by the geometry of their first member; the
/// remaining members are ignored.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureGeometry {
    /// A single position (`x = lon`, `y = lat`).
    Point(Point<f64>),
    /// An ordered sequence of positions, possibly empty.
    LineString(LineString<f64>),
}

impl FeatureGeometry {
    /// Representative coordinate: the point itself, or the midpoint of the
    /// bounding box of a non-empty line string.
    #[must_use]
    pub fn center(&self) -> Option<Coord<f64>> {
        match self {
            Self::Point(point) => Some(point.0),
            Self::LineString(line) => line.bounding_rect().map(|rect| rect.center()),
        }
    }

    /// Number of coordinates carried by the geometry.
    #[must_use]
    pub fn coordinate_count(&self) -> usize {
        match self {
            Self::Point(_) => 1,
            Self::LineString(line) => line.0.len(),
        }
    }
}

impl Serialize for FeatureGeometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("Geometry", 2)?;
        match self {
            Self::Point(point) => {
                state.serialize_field("type", "Point")?;
                state.serialize_field("coordinates", &[point.x(), point.y()])?;
            }
            Self::LineString(line) => {
                let coordinates: Vec<[f64; 2]> = line.coords().map(|c| [c.x, c.y]).collect();
                state.serialize_field("type", "LineString")?;
                state.serialize_field("coordinates", &coordinates)?;
            }
        }
        state.end()
    }
}

/// Convert every element of a fetch result into a [`Feature`].
///
/// Features carry a centre only when their geometry yields one; obtaining
/// centres for the rest is the caller's concern.
///
/// # Examples
///
/// ```
/// use cartosift_core::{ElementsResponse, TagClassifier, resolve_elements};
///
/// let response: ElementsResponse = serde_json::from_value(serde_json::json!({
///     "elements": [
///         {"type": "node", "id": 1, "lat": 50.0, "lon": 14.0},
///         {"type": "node", "id": 2, "lat": 51.0, "lon": 15.0},
///         {"type": "way", "id": 10, "nodes": [1, 2]}
///     ]
/// }))?;
/// let features = resolve_elements(&response.elements, &TagClassifier);
/// assert_eq!(features[2].center_lon_lat(), Some([14.5, 50.5]));
/// # Ok::<(), serde_json::Error>(())
/// ```
pub fn resolve_elements(elements: &[RawElement], classifier: &dyn Classifier) -> Vec<Feature> {
    let nodes = NodeIndex::new(elements);
    elements
        .iter()
        .map(|element| {
            let geometry = nodes.geometry_of(element);
            Feature::new(element.entity(), element.tags.clone(), geometry, classifier)
        })
        .collect()
}

/// Node positions keyed by id.
struct NodeIndex {
    positions: HashMap<u64, Coord<f64>>,
}

impl NodeIndex {
    fn new(elements: &[RawElement]) -> Self {
        let positions = elements
            .iter()
            .filter(|element| element.kind == ElementKind::Node)
            .filter_map(|node| node.position().map(|coord| (node.id, coord)))
            .collect();
        Self { positions }
    }

    fn geometry_of(&self, element: &RawElement) -> Option<FeatureGeometry> {
        match element.kind {
            ElementKind::Node => element
                .position()
                .map(|coord| FeatureGeometry::Point(Point(coord))),
            ElementKind::Way => Some(FeatureGeometry::LineString(self.way_line(element))),
            ElementKind::Relation => Some(FeatureGeometry::LineString(first_member_line(element))),
            ElementKind::Unknown => None,
        }
    }

    fn way_line(&self, way: &RawElement) -> LineString<f64> {
        way.nodes
            .iter()
            .flatten()
            .filter_map(|id| self.positions.get(id).copied())
            .collect()
    }
}

fn first_member_line(relation: &RawElement) -> LineString<f64> {
    relation
        .members
        .iter()
        .flatten()
        .next()
        .and_then(|member| member.geometry.as_ref())
        .into_iter()
        .flatten()
        .flatten()
        .map(|point| point.to_coord())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementsResponse;
    use crate::entity::EntityRef;
    use crate::feature::TagClassifier;
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    fn resolve(payload: Value) -> Vec<Feature> {
        let response: ElementsResponse = serde_json::from_value(payload).expect("valid payload");
        resolve_elements(&response.elements, &TagClassifier)
    }

    fn coords(feature: &Feature) -> Vec<(f64, f64)> {
        match feature.geometry.as_ref().expect("geometry") {
            FeatureGeometry::LineString(line) => line.coords().map(|c| (c.x, c.y)).collect(),
            FeatureGeometry::Point(point) => vec![(point.x(), point.y())],
        }
    }

    #[fixture]
    fn nodes() -> Vec<Value> {
        vec![
            json!({"type": "node", "id": 1, "lat": 50.0, "lon": 14.0}),
            json!({"type": "node", "id": 2, "lat": 50.5, "lon": 14.5}),
            json!({"type": "node", "id": 3, "lat": 51.0, "lon": 15.0}),
        ]
    }

    #[rstest]
    fn node_becomes_point_with_center() {
        let features = resolve(json!({"elements": [
            {"type": "node", "id": 9, "lat": 50.0, "lon": 14.0, "tags": {"amenity": "cafe"}}
        ]}));
        assert_eq!(features[0].entity, EntityRef::node(9));
        assert_eq!(coords(&features[0]), vec![(14.0, 50.0)]);
        assert_eq!(features[0].center_lon_lat(), Some([14.0, 50.0]));
    }

    #[rstest]
    fn way_keeps_node_order(nodes: Vec<Value>) {
        let mut elements = nodes;
        elements.push(json!({"type": "way", "id": 10, "nodes": [3, 1, 2]}));
        let features = resolve(json!({ "elements": elements }));
        let way = features.last().expect("way feature");
        assert_eq!(coords(way), vec![(15.0, 51.0), (14.0, 50.0), (14.5, 50.5)]);
        assert_eq!(way.center_lon_lat(), Some([14.5, 50.5]));
    }

    #[rstest]
    fn way_drops_missing_nodes(nodes: Vec<Value>) {
        let mut elements: Vec<Value> = nodes.into_iter().filter(|n| n["id"] != 2).collect();
        elements.push(json!({"type": "way", "id": 10, "nodes": [1, 2, 3]}));
        let features = resolve(json!({ "elements": elements }));
        let way = features.last().expect("way feature");
        assert_eq!(coords(way), vec![(14.0, 50.0), (15.0, 51.0)]);
    }

    #[rstest]
    fn way_without_nodes_has_no_center() {
        let features = resolve(json!({"elements": [
            {"type": "way", "id": 10, "nodes": [1, 2]}
        ]}));
        assert_eq!(
            features[0].geometry.as_ref().map(FeatureGeometry::coordinate_count),
            Some(0)
        );
        assert_eq!(features[0].center, None);
    }

    #[rstest]
    fn relation_uses_first_member_only() {
        let features = resolve(json!({"elements": [
            {"type": "relation", "id": 5, "members": [
                {"type": "way", "ref": 1, "role": "outer",
                 "geometry": [{"lat": 1.0, "lon": 2.0}, null, {"lat": 3.0, "lon": 4.0}]},
                {"type": "way", "ref": 2, "role": "outer",
                 "geometry": [{"lat": 9.0, "lon": 9.0}]}
            ]}
        ]}));
        assert_eq!(coords(&features[0]), vec![(2.0, 1.0), (4.0, 3.0)]);
        assert_eq!(features[0].center_lon_lat(), Some([3.0, 2.0]));
    }

    #[rstest]
    #[case(json!({"type": "relation", "id": 5, "members": []}))]
    #[case(json!({"type": "relation", "id": 5}))]
    #[case(json!({"type": "relation", "id": 5, "members": [
        {"type": "node", "ref": 1, "role": "", "geometry": [null, null]}
    ]}))]
    #[case(json!({"type": "relation", "id": 5, "members": [
        {"type": "node", "ref": 1, "role": "label"}
    ]}))]
    fn degenerate_relation_yields_empty_line(#[case] relation: Value) {
        let features = resolve(json!({ "elements": [relation] }));
        assert_eq!(
            features[0].geometry,
            Some(FeatureGeometry::LineString(LineString::new(Vec::new())))
        );
        assert_eq!(features[0].center, None);
    }

    #[rstest]
    fn unknown_kind_keeps_tags() {
        let features = resolve(json!({"elements": [
            {"type": "area", "id": 3, "tags": {"name": "Somewhere"}}
        ]}));
        assert_eq!(features[0].geometry, None);
        assert_eq!(
            features[0].tags.get("name").map(String::as_str),
            Some("Somewhere")
        );
    }
}
