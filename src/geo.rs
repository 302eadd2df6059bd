//! Spherical geometry and the coordinate value types it operates on.
//!
//! Distances are great-circle (Haversine) distances; they ignore elevation
//! and the road network. Durations assume a constant average speed.

use serde::{Deserialize, Serialize};

/// Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Average driving speed assumption for duration estimates.
pub const DEFAULT_SPEED_KMH: f64 = 50.0;

/// A coordinate on the Earth's surface with an optional label.
///
/// Equality is structural over the coordinates only; the name is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            name: None,
        }
    }

    pub fn named(latitude: f64, longitude: f64, name: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            name: Some(name.into()),
        }
    }

    /// `lat,lng` with six decimals, the form mapping web services expect.
    pub fn to_query_param(&self) -> String {
        format!("{:.6},{:.6}", self.latitude, self.longitude)
    }
}

impl PartialEq for GeoPoint {
    fn eq(&self, other: &Self) -> bool {
        self.latitude == other.latitude && self.longitude == other.longitude
    }
}

/// Delivery slot carried through with a waypoint. Not checked against travel time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

/// An intermediate stop on a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Waypoint {
    #[serde(flatten)]
    pub point: GeoPoint,
    /// 1 (lowest) to 5 (highest). Informational; the heuristic ignores it.
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_window: Option<TimeWindow>,
}

pub const DEFAULT_PRIORITY: u8 = 3;

fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

impl Waypoint {
    pub fn new(point: GeoPoint) -> Self {
        Self {
            point,
            priority: DEFAULT_PRIORITY,
            time_window: None,
        }
    }

    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self::new(GeoPoint::new(latitude, longitude))
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_time_window(mut self, start: i64, end: i64) -> Self {
        self.time_window = Some(TimeWindow { start, end });
        self
    }
}

/// Haversine great-circle distance in meters.
///
/// Symmetric, and exactly zero for coincident points.
pub fn great_circle_distance_meters(a: &GeoPoint, b: &GeoPoint) -> f64 {
    if a == b {
        return 0.0;
    }

    // Order the endpoints so d(a, b) and d(b, a) run the identical float ops.
    let (from, to) = if (a.latitude, a.longitude) <= (b.latitude, b.longitude) {
        (a, b)
    } else {
        (b, a)
    };

    let lat1_rad = from.latitude.to_radians();
    let lat2_rad = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lng = (to.longitude - from.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    // rounding can push h past 1.0 near the antipode
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Constant-speed travel time estimate at [`DEFAULT_SPEED_KMH`].
pub fn estimate_duration_seconds(distance_meters: f64) -> f64 {
    estimate_duration_seconds_at(distance_meters, DEFAULT_SPEED_KMH)
}

pub fn estimate_duration_seconds_at(distance_meters: f64, speed_kmh: f64) -> f64 {
    let meters_per_second = speed_kmh * 1000.0 / 3600.0;
    distance_meters / meters_per_second
}
