//! Unit tests for feature resolution and the request tracker.

use std::sync::Arc;
use std::time::Duration;

use cartosift_core::ElementKind;
use cartosift_core::test_support::StubFetcher;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;

fn endpoints() -> ServiceEndpoints {
    ServiceEndpoints::default()
        .with_osm_api_base("http://osm.test/api/0.6/")
        .with_overpass_url("http://overpass.test/api/interpreter")
}

fn resolver(fetcher: Arc<StubFetcher>) -> FeatureResolver<Arc<StubFetcher>> {
    FeatureResolver::new(fetcher, CenterCache::new()).with_endpoints(endpoints())
}

/// A way whose node references are not included in the response.
fn bare_way(id: u64) -> Value {
    json!({"elements": [
        {"type": "way", "id": id, "nodes": [1, 2, 3], "tags": {"highway": "footway"}}
    ]})
}

fn center(lat: f64, lon: f64) -> Value {
    json!({"elements": [{"center": {"lat": lat, "lon": lon}}]})
}

/// Route pattern matching the form-encoded Overpass query for a way.
fn overpass_way(id: u64) -> String {
    format!("way%28{id}%29")
}

#[fixture]
fn prague() -> Coord<f64> {
    Coord { x: 14.0, y: 50.0 }
}

#[rstest]
#[tokio::test]
async fn node_centre_comes_from_its_position() {
    let fetcher = Arc::new(StubFetcher::new().route(
        "node/123.json",
        json!({"elements": [
            {"type": "node", "id": 123, "lat": 50.5, "lon": 14.25, "tags": {"amenity": "cafe"}}
        ]}),
    ));
    let resolved = resolver(Arc::clone(&fetcher))
        .resolve_feature(EntityRef::node(123))
        .await
        .expect("node resolves");
    assert_eq!(resolved.entity, EntityRef::node(123));
    assert_eq!(resolved.feature.center_lon_lat(), Some([14.25, 50.5]));
    assert_eq!(resolved.feature.classification.subclass, "cafe");
    assert_eq!(fetcher.call_count(), 1);
}

#[rstest]
#[tokio::test]
async fn unwarmed_way_needs_aggregate_query_once(prague: Coord<f64>) {
    let fetcher = Arc::new(
        StubFetcher::new()
            .route("way/51050330.json", bare_way(51_050_330))
            .route(overpass_way(51_050_330), center(50.0, 14.0)),
    );
    let resolver = resolver(Arc::clone(&fetcher));
    let way = EntityRef::way(51_050_330);

    let first = resolver.resolve_feature(way).await.expect("way resolves");
    assert_eq!(first.feature.center, Some(prague));
    assert_eq!(fetcher.call_count(), 2);
    assert_eq!(resolver.cache().get(way), Some(prague));

    let second = resolver.resolve_feature(way).await.expect("way resolves");
    assert_eq!(second.feature.center, Some(prague));
    assert_eq!(fetcher.call_count(), 3);
    assert_eq!(fetcher.calls_matching("overpass.test"), 1);
}

#[rstest]
#[tokio::test]
async fn warmed_cache_skips_aggregate_query() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .route("way/51050330.json", bare_way(51_050_330))
            .route(overpass_way(51_050_330), center(50.0, 14.0)),
    );
    let resolver = resolver(Arc::clone(&fetcher));
    let way = EntityRef::way(51_050_330);
    let known = Coord { x: 123.0, y: 456.0 };
    resolver.add_feature_center_to_cache(way, known);

    let resolved = resolver.resolve_feature(way).await.expect("way resolves");
    assert_eq!(resolved.feature.center, Some(known));
    assert_eq!(fetcher.call_count(), 1);
}

#[rstest]
#[tokio::test]
async fn inline_geometry_supplies_the_centre() {
    let fetcher = Arc::new(StubFetcher::new().route(
        "way/7.json",
        json!({"elements": [
            {"type": "way", "id": 7, "nodes": [1, 2], "tags": {"highway": "path"}},
            {"type": "node", "id": 1, "lat": 49.5, "lon": 13.5},
            {"type": "node", "id": 2, "lat": 50.5, "lon": 14.5}
        ]}),
    ));
    let resolver = resolver(Arc::clone(&fetcher));
    let resolved = resolver
        .resolve_feature(EntityRef::way(7))
        .await
        .expect("way resolves");
    assert_eq!(resolved.feature.center_lon_lat(), Some([14.0, 50.0]));
    assert_eq!(fetcher.call_count(), 1);
    assert!(resolver.cache().is_empty());
}

#[rstest]
#[tokio::test]
async fn missing_element_is_not_found() {
    let fetcher = Arc::new(StubFetcher::new());
    let resolver = resolver(Arc::clone(&fetcher));
    let err = resolver
        .resolve_feature(EntityRef::relation(9))
        .await
        .expect_err("unrouted element");
    assert!(err.is_not_found());
    assert!(resolver.cache().is_empty());
}

#[rstest]
#[tokio::test]
async fn response_without_requested_element_is_not_found() {
    let fetcher = Arc::new(StubFetcher::new().route("node/5.json", json!({"elements": []})));
    let err = resolver(fetcher)
        .resolve_feature(EntityRef::node(5))
        .await
        .expect_err("empty response");
    assert_eq!(
        err,
        ResolveError::NotFound {
            entity: EntityRef::node(5)
        }
    );
}

#[rstest]
#[tokio::test]
async fn aggregate_failure_propagates_without_caching() {
    let failure = FetchError::Network {
        url: "http://overpass.test".to_owned(),
        message: "connection reset".to_owned(),
    };
    let fetcher = Arc::new(
        StubFetcher::new()
            .route("way/8.json", bare_way(8))
            .route_error(overpass_way(8), failure.clone()),
    );
    let resolver = resolver(fetcher);
    let err = resolver
        .resolve_feature(EntityRef::way(8))
        .await
        .expect_err("aggregate fails");
    assert_eq!(
        err,
        ResolveError::Network {
            entity: EntityRef::way(8),
            source: failure
        }
    );
    assert!(!err.is_not_found());
    assert!(resolver.cache().is_empty());
}

#[rstest]
#[case(404)]
#[case(410)]
#[tokio::test]
async fn missing_aggregate_answer_is_a_service_failure(#[case] status: u16) {
    let failure = FetchError::Http {
        url: "http://overpass.test".to_owned(),
        status,
    };
    let fetcher = Arc::new(
        StubFetcher::new()
            .route("way/8.json", bare_way(8))
            .route_error(overpass_way(8), failure.clone()),
    );
    let resolver = resolver(fetcher);
    let err = resolver
        .resolve_feature(EntityRef::way(8))
        .await
        .expect_err("aggregate fails");
    assert!(!err.is_not_found());
    assert_eq!(
        err,
        ResolveError::Network {
            entity: EntityRef::way(8),
            source: failure
        }
    );
    assert!(resolver.cache().is_empty());
}

#[rstest]
#[tokio::test]
async fn primary_gone_status_is_not_found() {
    let fetcher = Arc::new(StubFetcher::new().route_error(
        "node/6.json",
        FetchError::Http {
            url: "http://osm.test/api/0.6/node/6.json".to_owned(),
            status: 410,
        },
    ));
    let err = resolver(fetcher)
        .resolve_feature(EntityRef::node(6))
        .await
        .expect_err("deleted element");
    assert!(err.is_not_found());
}

#[rstest]
#[tokio::test]
async fn aggregate_without_centre_leaves_feature_uncentred() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .route("way/9.json", bare_way(9))
            .route(overpass_way(9), json!({"elements": []})),
    );
    let resolver = resolver(fetcher);
    let resolved = resolver
        .resolve_feature(EntityRef::way(9))
        .await
        .expect("way resolves");
    assert_eq!(resolved.feature.center, None);
    assert!(resolver.cache().is_empty());
}

#[rstest]
#[tokio::test]
async fn malformed_primary_response_is_a_decode_error() {
    let fetcher = Arc::new(StubFetcher::new().route("node/4.json", json!({"elements": 4})));
    let err = resolver(fetcher)
        .resolve_feature(EntityRef::node(4))
        .await
        .expect_err("malformed body");
    assert!(matches!(err, ResolveError::Decode { .. }));
}

#[rstest]
#[tokio::test]
async fn unknown_kind_is_rejected_before_fetching() {
    let fetcher = Arc::new(StubFetcher::new());
    let err = resolver(Arc::clone(&fetcher))
        .resolve_feature(EntityRef::new(ElementKind::Unknown, 1))
        .await
        .expect_err("unsupported kind");
    assert!(matches!(
        err,
        ResolveError::Identifier(IdentifierError::UnsupportedKind { .. })
    ));
    assert_eq!(fetcher.call_count(), 0);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn late_completion_is_discarded_and_caches_stay_independent() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .route("way/111.json", bare_way(111))
            .route_delayed(overpass_way(111), center(50.0, 14.0), Duration::from_millis(300))
            .route("way/222.json", bare_way(222))
            .route(overpass_way(222), center(48.0, 16.0)),
    );
    let resolver = resolver(fetcher);
    let tracker = RequestTracker::new();

    let ticket_a = tracker.begin(EntityRef::way(111));
    let ticket_b = tracker.begin(EntityRef::way(222));
    let (a, b) = tokio::join!(
        resolver.resolve_feature(ticket_a.entity()),
        resolver.resolve_feature(ticket_b.entity()),
    );
    let a = a.expect("first way resolves");
    let b = b.expect("second way resolves");

    assert_eq!(a.entity, EntityRef::way(111));
    assert!(tracker.accept(ticket_a, a).is_none());
    let shown = tracker.accept(ticket_b, b).expect("latest result applies");
    assert_eq!(shown.feature.center_lon_lat(), Some([16.0, 48.0]));

    assert_eq!(
        resolver.cache().get(EntityRef::way(111)),
        Some(Coord { x: 14.0, y: 50.0 })
    );
    assert_eq!(
        resolver.cache().get(EntityRef::way(222)),
        Some(Coord { x: 16.0, y: 48.0 })
    );
}

#[rstest]
fn tracker_issues_increasing_sequences() {
    let tracker = RequestTracker::new();
    let first = tracker.begin(EntityRef::node(1));
    let second = tracker.begin(EntityRef::node(1));
    assert!(second.sequence() > first.sequence());
    assert!(!tracker.is_current(&first));
    assert!(tracker.is_current(&second));
}

#[rstest]
fn tracker_rejects_results_for_another_entity(prague: Coord<f64>) {
    let tracker = RequestTracker::new();
    let ticket = tracker.begin(EntityRef::node(1));
    let mut feature = Feature::new(
        EntityRef::node(2),
        cartosift_core::Tags::new(),
        None,
        &TagClassifier,
    );
    feature.center = Some(prague);
    let resolved = Resolved {
        entity: EntityRef::node(2),
        feature,
    };
    assert!(tracker.accept(ticket, resolved).is_none());
}
