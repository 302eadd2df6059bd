//! Provider interfaces and the result shapes they produce.
//!
//! A [`DistanceProvider`] answers origin/destination distance questions; a
//! [`RouteProvider`] picks a visiting order for a closed tour. The local
//! Haversine provider only implements the former, the remote mapping provider
//! implements both.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderFailure;
use crate::geo::GeoPoint;
use crate::units::{self, UnitSystem};

/// Routing profile requested from the remote provider.
///
/// The local provider is mode-agnostic and always measures straight lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Walking,
    Bicycling,
    Transit,
}

impl TravelMode {
    pub const ALL: [TravelMode; 4] = [
        TravelMode::Driving,
        TravelMode::Walking,
        TravelMode::Bicycling,
        TravelMode::Transit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Walking => "walking",
            TravelMode::Bicycling => "bicycling",
            TravelMode::Transit => "transit",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixOptions {
    #[serde(default)]
    pub mode: TravelMode,
    #[serde(default)]
    pub units: UnitSystem,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default)]
    pub avoid_tolls: bool,
    #[serde(default)]
    pub avoid_highways: bool,
}

/// Outcome of a single origin/destination pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultStatus {
    Ok,
    NotFound,
    ZeroResults,
    MaxWaypointsExceeded,
    InvalidRequest,
}

impl ResultStatus {
    /// Parse a provider element status code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "OK" => Some(ResultStatus::Ok),
            "NOT_FOUND" => Some(ResultStatus::NotFound),
            "ZERO_RESULTS" => Some(ResultStatus::ZeroResults),
            "MAX_WAYPOINTS_EXCEEDED" => Some(ResultStatus::MaxWaypointsExceeded),
            "INVALID_REQUEST" => Some(ResultStatus::InvalidRequest),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Distance {
    pub text: String,
    /// Serialized as `valueMeters`; the provider-style `value` is accepted on input.
    #[serde(alias = "value")]
    pub value_meters: u64,
}

impl Distance {
    pub fn from_meters(meters: u64, units: UnitSystem) -> Self {
        Self {
            text: units::distance_text(meters, units),
            value_meters: meters,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Duration {
    pub text: String,
    #[serde(alias = "value")]
    pub value_seconds: u64,
}

impl Duration {
    pub fn from_seconds(seconds: u64) -> Self {
        Self {
            text: units::duration_text(seconds),
            value_seconds: seconds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceResult {
    pub origin: GeoPoint,
    pub destination: GeoPoint,
    pub distance: Distance,
    pub duration: Duration,
    pub status: ResultStatus,
}

impl DistanceResult {
    /// The result for a pair of coincident points: zero distance, zero time, OK.
    pub fn coincident(origin: &GeoPoint, destination: &GeoPoint, units: UnitSystem) -> Self {
        Self {
            origin: origin.clone(),
            destination: destination.clone(),
            distance: Distance::from_meters(0, units),
            duration: Duration::from_seconds(0),
            status: ResultStatus::Ok,
        }
    }
}

/// Visiting order chosen by a route provider for a depot-to-depot tour.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderRoute {
    /// Indices into the waypoint slice handed to the provider, in visiting order.
    pub waypoint_order: Vec<usize>,
    /// Leg distances in meters, depot to first stop through last stop to depot.
    pub leg_distances_meters: Vec<f64>,
    pub leg_durations_seconds: Vec<f64>,
}

/// Computes distances for origin/destination pairs.
#[async_trait]
pub trait DistanceProvider: Send + Sync {
    /// Short identifier used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Row-major results: for each origin in order, each destination in order.
    async fn matrix(
        &self,
        origins: &[GeoPoint],
        destinations: &[GeoPoint],
        options: &MatrixOptions,
    ) -> Result<Vec<DistanceResult>, ProviderFailure>;

    async fn distance(
        &self,
        origin: &GeoPoint,
        destination: &GeoPoint,
        options: &MatrixOptions,
    ) -> Result<DistanceResult, ProviderFailure> {
        let mut results = self
            .matrix(std::slice::from_ref(origin), std::slice::from_ref(destination), options)
            .await?;
        results
            .pop()
            .ok_or_else(|| ProviderFailure::InvalidResponse("empty result for a single pair".into()))
    }
}

/// Orders waypoints into a closed tour starting and ending at a depot.
#[async_trait]
pub trait RouteProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn optimized_route(
        &self,
        depot: &GeoPoint,
        waypoints: &[GeoPoint],
        mode: TravelMode,
    ) -> Result<ProviderRoute, ProviderFailure>;
}
