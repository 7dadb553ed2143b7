//! Behavioural tests for geometry resolution.

use std::cell::RefCell;

use cartosift_core::{ElementsResponse, Feature, FeatureGeometry, TagClassifier, resolve_elements};
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};

#[derive(Debug, Default)]
struct GeometryWorld {
    elements: RefCell<Vec<Value>>,
    features: RefCell<Vec<Feature>>,
}

#[fixture]
fn world() -> GeometryWorld {
    GeometryWorld::default()
}

fn node(id: u64, lon: f64, lat: f64) -> Value {
    json!({"type": "node", "id": id, "lat": lat, "lon": lon})
}

fn line_coords(feature: &Feature) -> Vec<(f64, f64)> {
    match feature.geometry.as_ref() {
        Some(FeatureGeometry::LineString(line)) => line.coords().map(|c| (c.x, c.y)).collect(),
        other => panic!("expected a line string, got {other:?}"),
    }
}

#[given("nodes A, B and C at distinct positions")]
fn given_three_nodes(#[from(world)] world: &GeometryWorld) {
    world
        .elements
        .borrow_mut()
        .extend([node(1, 14.0, 50.0), node(2, 14.5, 50.5), node(3, 15.0, 51.0)]);
}

#[given("nodes A and C at distinct positions")]
fn given_two_nodes(#[from(world)] world: &GeometryWorld) {
    world
        .elements
        .borrow_mut()
        .extend([node(1, 14.0, 50.0), node(3, 15.0, 51.0)]);
}

#[given("a way referencing A, B and C")]
fn given_way(#[from(world)] world: &GeometryWorld) {
    world
        .elements
        .borrow_mut()
        .push(json!({"type": "way", "id": 100, "nodes": [1, 2, 3]}));
}

#[given("a relation whose first member carries geometry with a null point")]
fn given_relation(#[from(world)] world: &GeometryWorld) {
    world.elements.borrow_mut().push(json!({
        "type": "relation",
        "id": 7,
        "members": [
            {"type": "way", "ref": 1, "role": "outer",
             "geometry": [{"lat": 1.0, "lon": 2.0}, null, {"lat": 3.0, "lon": 4.0}]},
            {"type": "way", "ref": 2, "role": "inner",
             "geometry": [{"lat": 5.0, "lon": 6.0}]}
        ]
    }));
}

#[given("an element of unknown kind with a name tag")]
fn given_unknown(#[from(world)] world: &GeometryWorld) {
    world
        .elements
        .borrow_mut()
        .push(json!({"type": "area", "id": 9, "tags": {"name": "Somewhere"}}));
}

#[when("I resolve the elements")]
fn when_resolve(#[from(world)] world: &GeometryWorld) {
    let payload = json!({ "elements": world.elements.borrow().clone() });
    let response: ElementsResponse =
        serde_json::from_value(payload).expect("fixture payload should parse");
    *world.features.borrow_mut() = resolve_elements(&response.elements, &TagClassifier);
}

#[then("the way has {count} coordinates in reference order")]
fn then_way_coords(count: usize, #[from(world)] world: &GeometryWorld) {
    let features = world.features.borrow();
    let way = features.last().expect("way feature");
    let coords = line_coords(way);
    assert_eq!(coords.len(), count);
    let expected: Vec<(f64, f64)> = [(14.0, 50.0), (14.5, 50.5), (15.0, 51.0)]
        .into_iter()
        .filter(|pair| count == 3 || *pair != (14.5, 50.5))
        .collect();
    assert_eq!(coords, expected);
}

#[then("the relation has {count} coordinates")]
fn then_relation_coords(count: usize, #[from(world)] world: &GeometryWorld) {
    let features = world.features.borrow();
    assert_eq!(line_coords(&features[0]).len(), count);
}

#[then("the feature has no geometry but keeps its tags")]
fn then_no_geometry(#[from(world)] world: &GeometryWorld) {
    let features = world.features.borrow();
    assert!(features[0].geometry.is_none());
    assert_eq!(
        features[0].tags.get("name").map(String::as_str),
        Some("Somewhere")
    );
}

#[scenario(path = "tests/features/geometry.feature", index = 0)]
fn way_with_all_nodes(world: GeometryWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/geometry.feature", index = 1)]
fn way_with_missing_node(world: GeometryWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/geometry.feature", index = 2)]
fn relation_first_member(world: GeometryWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/geometry.feature", index = 3)]
fn unknown_kind(world: GeometryWorld) {
    let _ = world;
}
