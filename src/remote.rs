//! Mapping web-service adapter for distance matrices and optimized directions.
//!
//! Speaks the Google Maps style contract: a `distancematrix` endpoint taking
//! pipe-delimited coordinate lists, and a `directions` endpoint that reorders
//! `optimize:true` waypoints.

use std::fmt;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ProviderFailure;
use crate::geo::GeoPoint;
use crate::traits::{
    Distance, DistanceProvider, DistanceResult, Duration, MatrixOptions, ProviderRoute, ResultStatus,
    RouteProvider, TravelMode,
};

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

#[derive(Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl RemoteConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            timeout_secs: 10,
        }
    }
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct RemoteMappingProvider {
    config: RemoteConfig,
    client: reqwest::Client,
}

impl RemoteMappingProvider {
    pub fn new(config: RemoteConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    async fn get<T>(&self, endpoint: &str, query: &[(&str, String)]) -> Result<T, ProviderFailure>
    where
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}/{}/json", self.config.base_url.trim_end_matches('/'), endpoint);

        let body = self
            .client
            .get(url)
            .query(query)
            .query(&[("key", self.config.api_key.as_str())])
            .send()
            .await?
            .error_for_status()?
            .json::<T>()
            .await?;

        Ok(body)
    }
}

fn pipe_join(points: &[GeoPoint]) -> String {
    points
        .iter()
        .map(GeoPoint::to_query_param)
        .collect::<Vec<_>>()
        .join("|")
}

fn matrix_query(origins: &[GeoPoint], destinations: &[GeoPoint], options: &MatrixOptions) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("origins", pipe_join(origins)),
        ("destinations", pipe_join(destinations)),
        ("mode", options.mode.as_str().to_string()),
        ("units", options.units.as_str().to_string()),
    ];
    if let Some(language) = &options.language {
        query.push(("language", language.clone()));
    }

    let mut avoid = Vec::new();
    if options.avoid_tolls {
        avoid.push("tolls");
    }
    if options.avoid_highways {
        avoid.push("highways");
    }
    if !avoid.is_empty() {
        query.push(("avoid", avoid.join("|")));
    }
    query
}

fn directions_query(depot: &GeoPoint, waypoints: &[GeoPoint], mode: TravelMode) -> Vec<(&'static str, String)> {
    let stops = waypoints
        .iter()
        .map(GeoPoint::to_query_param)
        .collect::<Vec<_>>()
        .join("|");

    vec![
        ("origin", depot.to_query_param()),
        ("destination", depot.to_query_param()),
        ("waypoints", format!("optimize:true|{}", stops)),
        ("mode", mode.as_str().to_string()),
    ]
}

#[async_trait]
impl DistanceProvider for RemoteMappingProvider {
    fn name(&self) -> &'static str {
        "google-maps"
    }

    async fn matrix(
        &self,
        origins: &[GeoPoint],
        destinations: &[GeoPoint],
        options: &MatrixOptions,
    ) -> Result<Vec<DistanceResult>, ProviderFailure> {
        if origins.is_empty() || destinations.is_empty() {
            return Ok(Vec::new());
        }

        debug!(
            origins = origins.len(),
            destinations = destinations.len(),
            mode = options.mode.as_str(),
            "requesting remote distance matrix"
        );

        let query = matrix_query(origins, destinations, options);
        let body: MatrixResponse = self.get("distancematrix", &query).await.inspect_err(|err| {
            warn!(error = %err, "remote distance matrix request failed");
        })?;

        assemble_matrix(body, origins, destinations, options)
    }
}

#[async_trait]
impl RouteProvider for RemoteMappingProvider {
    fn name(&self) -> &'static str {
        "google-maps"
    }

    async fn optimized_route(
        &self,
        depot: &GeoPoint,
        waypoints: &[GeoPoint],
        mode: TravelMode,
    ) -> Result<ProviderRoute, ProviderFailure> {
        debug!(waypoints = waypoints.len(), "requesting remote optimized directions");

        let query = directions_query(depot, waypoints, mode);
        let body: DirectionsResponse = self.get("directions", &query).await.inspect_err(|err| {
            warn!(error = %err, "remote directions request failed");
        })?;

        assemble_route(body, waypoints.len())
    }
}

/// Turn a distance-matrix body into row-major results.
///
/// A non-OK top-level status is a provider failure; per-element statuses are
/// carried into the individual results.
fn assemble_matrix(
    body: MatrixResponse,
    origins: &[GeoPoint],
    destinations: &[GeoPoint],
    options: &MatrixOptions,
) -> Result<Vec<DistanceResult>, ProviderFailure> {
    check_status(&body.status, body.error_message)?;

    if body.rows.len() != origins.len() {
        return Err(ProviderFailure::InvalidResponse(format!(
            "expected {} rows, got {}",
            origins.len(),
            body.rows.len()
        )));
    }

    let mut results = Vec::with_capacity(origins.len() * destinations.len());
    for (row_index, (row, origin)) in body.rows.into_iter().zip(origins).enumerate() {
        if row.elements.len() != destinations.len() {
            return Err(ProviderFailure::InvalidResponse(format!(
                "row {} has {} elements, expected {}",
                row_index,
                row.elements.len(),
                destinations.len()
            )));
        }

        for (element, destination) in row.elements.into_iter().zip(destinations) {
            if origin == destination {
                results.push(DistanceResult::coincident(origin, destination, options.units));
                continue;
            }

            let status = ResultStatus::from_code(&element.status).ok_or_else(|| {
                ProviderFailure::InvalidResponse(format!("unknown element status {}", element.status))
            })?;

            let (distance, duration) = match (element.distance, element.duration) {
                (Some(distance), Some(duration)) => (
                    Distance {
                        text: distance.text,
                        value_meters: distance.value.max(0.0).round() as u64,
                    },
                    Duration {
                        text: duration.text,
                        value_seconds: duration.value.max(0.0).round() as u64,
                    },
                ),
                // only unroutable pairs may come without figures
                _ if status != ResultStatus::Ok => (Distance::from_meters(0, options.units), Duration::from_seconds(0)),
                _ => {
                    return Err(ProviderFailure::InvalidResponse(format!(
                        "row {} element reports OK without distance and duration",
                        row_index
                    )));
                }
            };

            results.push(DistanceResult {
                origin: origin.clone(),
                destination: destination.clone(),
                distance,
                duration,
                status,
            });
        }
    }

    Ok(results)
}

fn assemble_route(body: DirectionsResponse, waypoint_count: usize) -> Result<ProviderRoute, ProviderFailure> {
    check_status(&body.status, body.error_message)?;

    let route = body
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| ProviderFailure::InvalidResponse("no routes in directions response".into()))?;

    let mut seen = vec![false; waypoint_count];
    for &index in &route.waypoint_order {
        match seen.get_mut(index) {
            Some(slot) if !*slot => *slot = true,
            _ => {
                return Err(ProviderFailure::InvalidResponse(format!(
                    "waypoint order {:?} is not a permutation of {} waypoints",
                    route.waypoint_order, waypoint_count
                )));
            }
        }
    }
    if route.waypoint_order.len() != waypoint_count {
        return Err(ProviderFailure::InvalidResponse(format!(
            "waypoint order has {} entries, expected {}",
            route.waypoint_order.len(),
            waypoint_count
        )));
    }
    if route.legs.len() != waypoint_count + 1 {
        return Err(ProviderFailure::InvalidResponse(format!(
            "expected {} legs, got {}",
            waypoint_count + 1,
            route.legs.len()
        )));
    }

    Ok(ProviderRoute {
        waypoint_order: route.waypoint_order,
        leg_distances_meters: route.legs.iter().map(|leg| leg.distance.value).collect(),
        leg_durations_seconds: route.legs.iter().map(|leg| leg.duration.value).collect(),
    })
}

fn check_status(status: &str, error_message: Option<String>) -> Result<(), ProviderFailure> {
    if status == "OK" {
        Ok(())
    } else {
        Err(ProviderFailure::Status {
            status: status.to_string(),
            message: error_message,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
    value: f64,
}

#[derive(Debug, Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Debug, Deserialize)]
struct MatrixRow {
    elements: Vec<MatrixElement>,
}

#[derive(Debug, Deserialize)]
struct MatrixElement {
    status: String,
    distance: Option<TextValue>,
    duration: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    #[serde(default)]
    waypoint_order: Vec<usize>,
    legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    distance: TextValue,
    duration: TextValue,
}
