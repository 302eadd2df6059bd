//! Derived figures for a computed route: fuel, compactness score, savings.
//!
//! All constants are fixed parameters of the model, not measurements.

use serde::{Deserialize, Serialize};

/// Consumption assumption: 7 L/100 km.
pub const FUEL_LITERS_PER_KM: f64 = 0.07;
/// Per-stop distance at which the efficiency score starts dropping below 100.
pub const EFFICIENCY_BASELINE_METERS: f64 = 5000.0;
/// Meters of extra per-stop distance that cost one score point.
pub const EFFICIENCY_METERS_PER_POINT: f64 = 100.0;
/// Distance assumed for serving each stop on its own round trip.
pub const NAIVE_METERS_PER_STOP: f64 = 15_000.0;
/// Money saved per kilometer not driven, in euros.
pub const SAVING_PER_KM: f64 = 0.50;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMetrics {
    pub estimated_fuel_liters: f64,
    /// 0 to 100, higher for tighter routes.
    pub efficiency_score: f64,
    /// Never negative.
    pub cost_saving_estimate: f64,
}

impl RouteMetrics {
    pub fn compute(total_distance_meters: f64, total_stops: usize) -> Self {
        Self {
            estimated_fuel_liters: fuel_liters(total_distance_meters),
            efficiency_score: efficiency_score(total_distance_meters, total_stops),
            cost_saving_estimate: cost_saving_estimate(total_distance_meters, total_stops),
        }
    }
}

pub fn fuel_liters(total_distance_meters: f64) -> f64 {
    (total_distance_meters / 1000.0) * FUEL_LITERS_PER_KM
}

pub fn efficiency_score(total_distance_meters: f64, total_stops: usize) -> f64 {
    if total_stops == 0 {
        return 0.0;
    }
    let avg_per_stop = total_distance_meters / total_stops as f64;
    let score = 100.0 - (avg_per_stop - EFFICIENCY_BASELINE_METERS) / EFFICIENCY_METERS_PER_POINT;
    score.clamp(0.0, 100.0)
}

pub fn cost_saving_estimate(total_distance_meters: f64, total_stops: usize) -> f64 {
    let saved_km = (total_stops as f64 * NAIVE_METERS_PER_STOP - total_distance_meters) / 1000.0;
    saved_km.max(0.0) * SAVING_PER_KM
}
