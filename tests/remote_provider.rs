//! Remote mapping provider against an in-process HTTP stub.

mod fixtures;

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use dispatch_geo::config::FailurePolicy;
use dispatch_geo::error::{DispatchError, Operation, ProviderFailure};
use dispatch_geo::geo::GeoPoint;
use dispatch_geo::haversine::LocalHaversineProvider;
use dispatch_geo::matrix::DistanceMatrixService;
use dispatch_geo::optimizer::{OptimizeOptions, RouteOptimizer, RouteStrategy};
use dispatch_geo::remote::{RemoteConfig, RemoteMappingProvider};
use dispatch_geo::traits::{DistanceProvider, MatrixOptions, ResultStatus, RouteProvider, TravelMode};

use fixtures::{deliveries, hub, StubServer};

const MATRIX_OK: &str = r#"{
    "status": "OK",
    "origin_addresses": ["Gare de Lyon"],
    "destination_addresses": ["Bastille", "République"],
    "rows": [{"elements": [
        {"status": "OK", "distance": {"text": "1.4 km", "value": 1432}, "duration": {"text": "6 mins", "value": 351}},
        {"status": "NOT_FOUND"}
    ]}]
}"#;

const DIRECTIONS_OK: &str = r#"{
    "status": "OK",
    "routes": [{
        "waypoint_order": [2, 0, 1],
        "legs": [
            {"distance": {"text": "2.1 km", "value": 2100}, "duration": {"text": "7 mins", "value": 420}},
            {"distance": {"text": "1.5 km", "value": 1500}, "duration": {"text": "5 mins", "value": 300}},
            {"distance": {"text": "1.8 km", "value": 1800}, "duration": {"text": "6 mins", "value": 360}},
            {"distance": {"text": "2.6 km", "value": 2600}, "duration": {"text": "9 mins", "value": 540}}
        ]
    }]
}"#;

fn provider(server: &StubServer, timeout_secs: u64) -> RemoteMappingProvider {
    let config = RemoteConfig {
        base_url: server.base_url.clone(),
        api_key: "test-key".to_string(),
        timeout_secs,
    };
    RemoteMappingProvider::new(config).expect("build remote provider")
}

#[tokio::test]
async fn matrix_request_carries_options_and_key() {
    let server = StubServer::json(MATRIX_OK).await;
    let provider = provider(&server, 5);

    let origins = vec![hub()];
    let destinations = vec![GeoPoint::new(48.8532, 2.3692), GeoPoint::new(48.8674, 2.3636)];
    let options = MatrixOptions {
        mode: TravelMode::Walking,
        avoid_tolls: true,
        ..Default::default()
    };

    let results = provider.matrix(&origins, &destinations, &options).await.unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].distance.value_meters, 1432);
    assert_eq!(results[0].duration.value_seconds, 351);
    assert_eq!(results[0].status, ResultStatus::Ok);
    assert_eq!(results[1].status, ResultStatus::NotFound);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let line = &requests[0];
    assert!(line.starts_with("GET /distancematrix/json?"), "{}", line);
    assert!(line.contains("mode=walking"), "{}", line);
    assert!(line.contains("avoid=tolls"), "{}", line);
    assert!(line.contains("key=test-key"), "{}", line);
    // destinations are pipe-delimited
    assert!(line.contains("%7C"), "{}", line);
}

#[tokio::test]
async fn matrix_status_error_surfaces_as_provider_error() {
    let server = StubServer::json(r#"{"status": "OVER_QUERY_LIMIT", "rows": []}"#).await;
    let remote = std::sync::Arc::new(provider(&server, 5));
    let service = DistanceMatrixService::with_remote(LocalHaversineProvider::default(), remote, FailurePolicy::Fail);

    let p = vec![hub()];
    let err = service
        .compute_matrix(&p, &p, &MatrixOptions::default(), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        DispatchError::Provider {
            provider,
            operation,
            failure: ProviderFailure::Status { status, .. },
        } => {
            assert_eq!(provider, "google-maps");
            assert_eq!(operation, Operation::Matrix);
            assert_eq!(status, "OVER_QUERY_LIMIT");
        }
        other => panic!("expected provider status error, got {:?}", other),
    }
}

#[tokio::test]
async fn http_error_does_not_leak_api_key() {
    let server = StubServer::start(500, "oops", Duration::ZERO).await;
    let provider = provider(&server, 5);

    let p = vec![hub()];
    let err = provider.matrix(&p, &p, &MatrixOptions::default()).await.unwrap_err();
    assert_eq!(err, ProviderFailure::Http(500));
    assert!(!err.to_string().contains("test-key"));
}

#[tokio::test]
async fn unreachable_provider_is_transport_failure_without_key() {
    let mut config = RemoteConfig::new("test-key");
    // nothing listens on the discard port
    config.base_url = "http://127.0.0.1:9".to_string();
    config.timeout_secs = 5;
    let provider = RemoteMappingProvider::new(config).unwrap();

    let p = vec![hub()];
    let err = provider.matrix(&p, &p, &MatrixOptions::default()).await.unwrap_err();
    assert!(!err.to_string().contains("test-key"), "{}", err);
}

#[tokio::test]
async fn slow_provider_times_out() {
    let server = StubServer::start(200, MATRIX_OK, Duration::from_secs(10)).await;
    let provider = provider(&server, 1);

    let p = vec![hub()];
    let err = provider.matrix(&p, &p, &MatrixOptions::default()).await.unwrap_err();
    assert_eq!(err, ProviderFailure::Timeout);
}

#[tokio::test]
async fn cancellation_aborts_in_flight_request() {
    let server = StubServer::start(200, MATRIX_OK, Duration::from_secs(30)).await;
    let remote = std::sync::Arc::new(provider(&server, 60));
    let service = DistanceMatrixService::with_remote(LocalHaversineProvider::default(), remote, FailurePolicy::Fail);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let p = vec![hub()];
    let err = service
        .compute_matrix(&p, &p, &MatrixOptions::default(), &cancel)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DispatchError::Provider {
            failure: ProviderFailure::Cancelled,
            ..
        }
    ));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn directions_order_maps_back_to_input_indices() {
    let server = StubServer::json(DIRECTIONS_OK).await;
    let remote = std::sync::Arc::new(provider(&server, 5));
    let optimizer = RouteOptimizer::with_remote(remote, FailurePolicy::Fail);

    let waypoints = deliveries(3);
    let route = optimizer
        .optimize(&hub(), &waypoints, &OptimizeOptions::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(route.strategy, RouteStrategy::Provider);
    let indices: Vec<usize> = route.ordered_stops.iter().map(|s| s.original_index).collect();
    assert_eq!(indices, vec![2, 0, 1]);
    for stop in &route.ordered_stops {
        assert_eq!(stop.waypoint, waypoints[stop.original_index]);
    }
    assert_eq!(route.total_distance_meters, 8000.0);
    assert_eq!(route.total_duration_seconds, 1620);
    assert_eq!(route.legs.len(), 4);

    let line = &server.requests()[0];
    assert!(line.starts_with("GET /directions/json?"), "{}", line);
    assert!(line.contains("optimize%3Atrue"), "{}", line);
}

#[tokio::test]
async fn directions_error_with_fallback_policy_uses_nearest_neighbor() {
    let server = StubServer::json(r#"{"status": "ZERO_RESULTS", "routes": []}"#).await;
    let remote = std::sync::Arc::new(provider(&server, 5));
    let optimizer = RouteOptimizer::with_remote(remote, FailurePolicy::FallbackToLocal);

    let route = optimizer
        .optimize(&hub(), &deliveries(4), &OptimizeOptions::default(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(route.strategy, RouteStrategy::NearestNeighborFallback);
    assert_eq!(route.ordered_stops.len(), 4);
}

#[tokio::test]
async fn route_provider_trait_call() {
    let server = StubServer::json(DIRECTIONS_OK).await;
    let provider = provider(&server, 5);
    let points: Vec<GeoPoint> = deliveries(3).into_iter().map(|w| w.point).collect();

    let route = provider
        .optimized_route(&hub(), &points, TravelMode::Driving)
        .await
        .unwrap();
    assert_eq!(route.waypoint_order, vec![2, 0, 1]);
    assert_eq!(route.leg_distances_meters.len(), 4);
}
