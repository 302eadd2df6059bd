//! Haversine distance provider (used when no mapping provider is configured).
//!
//! Uses great-circle distance and a constant speed to estimate travel time.
//! Less accurate than a road-network provider but always available and never fails.

use async_trait::async_trait;

use crate::error::ProviderFailure;
use crate::geo::{self, GeoPoint, DEFAULT_SPEED_KMH};
use crate::traits::{Distance, DistanceProvider, DistanceResult, Duration, MatrixOptions, ResultStatus};

/// Straight-line distance provider.
#[derive(Debug, Clone)]
pub struct LocalHaversineProvider {
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
}

impl Default for LocalHaversineProvider {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl LocalHaversineProvider {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    /// Synchronous pair computation; the async trait methods delegate here.
    pub fn pair(&self, origin: &GeoPoint, destination: &GeoPoint, options: &MatrixOptions) -> DistanceResult {
        if origin == destination {
            return DistanceResult::coincident(origin, destination, options.units);
        }

        let meters = geo::great_circle_distance_meters(origin, destination);
        let seconds = geo::estimate_duration_seconds_at(meters, self.speed_kmh);

        DistanceResult {
            origin: origin.clone(),
            destination: destination.clone(),
            distance: Distance::from_meters(meters.round() as u64, options.units),
            duration: Duration::from_seconds(seconds.round() as u64),
            status: ResultStatus::Ok,
        }
    }

    pub fn compute(&self, origins: &[GeoPoint], destinations: &[GeoPoint], options: &MatrixOptions) -> Vec<DistanceResult> {
        let mut results = Vec::with_capacity(origins.len() * destinations.len());
        for origin in origins {
            for destination in destinations {
                results.push(self.pair(origin, destination, options));
            }
        }
        results
    }
}

#[async_trait]
impl DistanceProvider for LocalHaversineProvider {
    fn name(&self) -> &'static str {
        "haversine"
    }

    async fn matrix(
        &self,
        origins: &[GeoPoint],
        destinations: &[GeoPoint],
        options: &MatrixOptions,
    ) -> Result<Vec<DistanceResult>, ProviderFailure> {
        Ok(self.compute(origins, destinations, options))
    }
}
