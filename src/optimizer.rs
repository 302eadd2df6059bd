//! Single-vehicle visiting order for a depot and its waypoints.
//!
//! Small problems are delegated to a configured route provider; everything
//! else uses a greedy nearest-neighbor construction. The greedy order is an
//! approximation and is reported as such through [`RouteStrategy`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{FailurePolicy, DEFAULT_REMOTE_ROUTE_MAX_WAYPOINTS};
use crate::error::{DispatchError, Operation, ProviderFailure, Result};
use crate::geo::{self, GeoPoint, Waypoint, DEFAULT_SPEED_KMH};
use crate::matrix::run_cancellable;
use crate::metrics::RouteMetrics;
use crate::traits::{ProviderRoute, RouteProvider, TravelMode};
use crate::validate;

/// What the caller wants minimized.
///
/// With constant speed and constant consumption, time and fuel are both
/// proportional to distance, so every objective produces the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    #[default]
    Distance,
    Time,
    Fuel,
}

impl Objective {
    pub const ALL: [Objective; 3] = [Objective::Distance, Objective::Time, Objective::Fuel];
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeOptions {
    #[serde(default)]
    pub optimize_for: Objective,
    /// Routing profile for the remote provider.
    #[serde(default)]
    pub mode: TravelMode,
    /// Unix seconds the vehicle leaves the depot. Enables stop timestamps.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<i64>,
    /// Time spent at each stop before driving on.
    #[serde(default)]
    pub service_seconds: u64,
}

/// How the visiting order was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteStrategy {
    Provider,
    NearestNeighbor,
    NearestNeighborFallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedStop {
    /// Index of this waypoint in the caller's input.
    pub original_index: usize,
    pub waypoint: Waypoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteLeg {
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    pub total_stops: usize,
    pub efficiency_score: f64,
    pub cost_saving_estimate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizedRoute {
    pub ordered_stops: Vec<OrderedStop>,
    /// Depot to first stop, between stops, last stop back to depot.
    pub legs: Vec<RouteLeg>,
    pub total_distance_meters: f64,
    pub total_duration_seconds: u64,
    pub estimated_fuel_liters: f64,
    pub summary: RouteSummary,
    pub strategy: RouteStrategy,
    pub optimize_for: Objective,
}

/// Greedy nearest-neighbor order starting from `depot`.
///
/// Returns indices into `points`. At each step the closest unvisited point
/// wins; on an exact tie the one earliest in the input keeps the slot.
pub fn nearest_neighbor_order(depot: &GeoPoint, points: &[GeoPoint]) -> Vec<usize> {
    let mut remaining: Vec<usize> = (0..points.len()).collect();
    let mut order = Vec::with_capacity(points.len());
    let mut current = depot;

    while !remaining.is_empty() {
        let mut best_pos = 0;
        let mut best_distance = f64::INFINITY;

        for (pos, &index) in remaining.iter().enumerate() {
            let distance = geo::great_circle_distance_meters(current, &points[index]);
            // strict comparison keeps the first of equal candidates
            if distance < best_distance {
                best_distance = distance;
                best_pos = pos;
            }
        }

        let next = remaining.remove(best_pos);
        order.push(next);
        current = &points[next];
    }

    order
}

/// Closed-loop leg distances for visiting `points` in `order` from `depot`.
pub fn closed_loop_legs(depot: &GeoPoint, points: &[GeoPoint], order: &[usize]) -> Vec<f64> {
    let mut legs = Vec::with_capacity(order.len() + 1);
    let mut current = depot;
    for &index in order {
        legs.push(geo::great_circle_distance_meters(current, &points[index]));
        current = &points[index];
    }
    legs.push(geo::great_circle_distance_meters(current, depot));
    legs
}

#[derive(Clone)]
pub struct RouteOptimizer {
    remote: Option<Arc<dyn RouteProvider>>,
    failure_policy: FailurePolicy,
    remote_max_waypoints: usize,
    speed_kmh: f64,
}

impl Default for RouteOptimizer {
    fn default() -> Self {
        Self::local()
    }
}

impl RouteOptimizer {
    pub fn local() -> Self {
        Self {
            remote: None,
            failure_policy: FailurePolicy::Fail,
            remote_max_waypoints: DEFAULT_REMOTE_ROUTE_MAX_WAYPOINTS,
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }

    pub fn with_remote(remote: Arc<dyn RouteProvider>, failure_policy: FailurePolicy) -> Self {
        Self {
            remote: Some(remote),
            failure_policy,
            ..Self::local()
        }
    }

    pub fn remote_max_waypoints(mut self, max: usize) -> Self {
        self.remote_max_waypoints = max;
        self
    }

    pub fn speed_kmh(mut self, speed_kmh: f64) -> Self {
        self.speed_kmh = speed_kmh;
        self
    }

    pub fn remote_threshold(&self) -> usize {
        self.remote_max_waypoints
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub async fn optimize(
        &self,
        depot: &GeoPoint,
        waypoints: &[Waypoint],
        options: &OptimizeOptions,
        cancel: &CancellationToken,
    ) -> Result<OptimizedRoute> {
        validate::optimize_request(depot, waypoints)?;

        let points: Vec<GeoPoint> = waypoints.iter().map(|w| w.point.clone()).collect();

        let remote = match &self.remote {
            Some(remote) if waypoints.len() <= self.remote_max_waypoints => remote,
            _ => {
                debug!(waypoints = waypoints.len(), "ordering waypoints with nearest neighbor");
                return self.local_route(depot, waypoints, &points, options, RouteStrategy::NearestNeighbor);
            }
        };

        let outcome = run_cancellable(cancel, remote.optimized_route(depot, &points, options.mode)).await;
        match outcome {
            Ok(route) => {
                info!(
                    provider = remote.name(),
                    waypoints = waypoints.len(),
                    "waypoint order chosen by provider"
                );
                provider_route(remote.name(), waypoints, route, options)
            }
            Err(failure) => {
                if self.failure_policy == FailurePolicy::FallbackToLocal && failure != ProviderFailure::Cancelled {
                    warn!(
                        provider = remote.name(),
                        error = %failure,
                        "remote route optimization failed, falling back to nearest neighbor"
                    );
                    return self.local_route(
                        depot,
                        waypoints,
                        &points,
                        options,
                        RouteStrategy::NearestNeighborFallback,
                    );
                }
                Err(DispatchError::Provider {
                    provider: remote.name(),
                    operation: Operation::Optimize,
                    failure,
                })
            }
        }
    }

    fn local_route(
        &self,
        depot: &GeoPoint,
        waypoints: &[Waypoint],
        points: &[GeoPoint],
        options: &OptimizeOptions,
        strategy: RouteStrategy,
    ) -> Result<OptimizedRoute> {
        let order = nearest_neighbor_order(depot, points);
        let leg_distances = closed_loop_legs(depot, points, &order);
        let total_distance: f64 = leg_distances.iter().sum();

        let legs = leg_distances
            .iter()
            .map(|&distance| RouteLeg {
                distance_meters: distance,
                duration_seconds: geo::estimate_duration_seconds_at(distance, self.speed_kmh),
            })
            .collect::<Vec<_>>();

        // converted once from the total, not summed from the legs
        let total_duration = geo::estimate_duration_seconds_at(total_distance, self.speed_kmh).round() as u64;

        assemble(waypoints, &order, legs, total_distance, total_duration, strategy, options)
    }
}

fn provider_route(
    provider: &'static str,
    waypoints: &[Waypoint],
    route: ProviderRoute,
    options: &OptimizeOptions,
) -> Result<OptimizedRoute> {
    let invalid = |message: String| DispatchError::Provider {
        provider,
        operation: Operation::Optimize,
        failure: ProviderFailure::InvalidResponse(message),
    };

    if !is_permutation(&route.waypoint_order, waypoints.len()) {
        return Err(invalid(format!(
            "waypoint order {:?} does not cover {} waypoints",
            route.waypoint_order,
            waypoints.len()
        )));
    }
    if route.leg_distances_meters.len() != waypoints.len() + 1
        || route.leg_durations_seconds.len() != route.leg_distances_meters.len()
    {
        return Err(invalid(format!(
            "expected {} legs, got {}",
            waypoints.len() + 1,
            route.leg_distances_meters.len()
        )));
    }

    let legs = route
        .leg_distances_meters
        .iter()
        .zip(&route.leg_durations_seconds)
        .map(|(&distance, &duration)| RouteLeg {
            distance_meters: distance,
            duration_seconds: duration,
        })
        .collect::<Vec<_>>();
    let total_distance: f64 = route.leg_distances_meters.iter().sum();
    let total_duration = route.leg_durations_seconds.iter().sum::<f64>().round() as u64;

    assemble(
        waypoints,
        &route.waypoint_order,
        legs,
        total_distance,
        total_duration,
        RouteStrategy::Provider,
        options,
    )
}

fn is_permutation(order: &[usize], n: usize) -> bool {
    if order.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    for &index in order {
        match seen.get_mut(index) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    true
}

fn assemble(
    waypoints: &[Waypoint],
    order: &[usize],
    legs: Vec<RouteLeg>,
    total_distance_meters: f64,
    total_duration_seconds: u64,
    strategy: RouteStrategy,
    options: &OptimizeOptions,
) -> Result<OptimizedRoute> {
    if order.len() != waypoints.len() || legs.len() != order.len() + 1 {
        return Err(DispatchError::Computation {
            operation: Operation::Optimize,
            message: format!(
                "route covers {} of {} waypoints with {} legs",
                order.len(),
                waypoints.len(),
                legs.len()
            ),
        });
    }

    let mut clock = options.departure_time.map(|t| t as f64);
    let ordered_stops = order
        .iter()
        .zip(&legs)
        .map(|(&index, leg)| {
            let arrival = clock.map(|t| t + leg.duration_seconds);
            let departure = arrival.map(|t| t + options.service_seconds as f64);
            clock = departure;
            OrderedStop {
                original_index: index,
                waypoint: waypoints[index].clone(),
                arrival_time: arrival.map(|t| t.round() as i64),
                departure_time: departure.map(|t| t.round() as i64),
            }
        })
        .collect::<Vec<_>>();

    let metrics = RouteMetrics::compute(total_distance_meters, ordered_stops.len());

    Ok(OptimizedRoute {
        summary: RouteSummary {
            total_stops: ordered_stops.len(),
            efficiency_score: metrics.efficiency_score,
            cost_saving_estimate: metrics.cost_saving_estimate,
        },
        ordered_stops,
        legs,
        total_distance_meters,
        total_duration_seconds,
        estimated_fuel_liters: metrics.estimated_fuel_liters,
        strategy,
        optimize_for: options.optimize_for,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<GeoPoint> {
        coords.iter().map(|&(lat, lng)| GeoPoint::new(lat, lng)).collect()
    }

    #[test]
    fn test_nearest_neighbor_visits_closer_first() {
        let order = nearest_neighbor_order(&GeoPoint::new(0.0, 0.0), &pts(&[(0.0, 2.0), (0.0, 1.0)]));
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn test_tie_break_prefers_earlier_input() {
        // (0, 1) and (0, -1) are equidistant from the depot
        let order = nearest_neighbor_order(&GeoPoint::new(0.0, 0.0), &pts(&[(0.0, 1.0), (0.0, -1.0)]));
        assert_eq!(order, vec![0, 1]);

        let order = nearest_neighbor_order(&GeoPoint::new(0.0, 0.0), &pts(&[(0.0, -1.0), (0.0, 1.0)]));
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn test_tie_break_after_removal_keeps_relative_order() {
        // After visiting index 1, indices 0 and 2 (same coordinates) tie; 0 comes first.
        let order = nearest_neighbor_order(
            &GeoPoint::new(0.0, 0.0),
            &pts(&[(0.0, 3.0), (0.0, 1.0), (0.0, 3.0)]),
        );
        assert_eq!(order, vec![1, 0, 2]);
    }

    #[test]
    fn test_coincident_with_depot_is_visited_once() {
        let order = nearest_neighbor_order(&GeoPoint::new(0.0, 0.0), &pts(&[(0.0, 1.0), (0.0, 0.0)]));
        assert_eq!(order, vec![1, 0]);
        let legs = closed_loop_legs(&GeoPoint::new(0.0, 0.0), &pts(&[(0.0, 1.0), (0.0, 0.0)]), &order);
        assert_eq!(legs[0], 0.0);
    }

    #[test]
    fn test_closed_loop_legs_count() {
        let points = pts(&[(0.0, 1.0), (0.0, 2.0), (0.0, 3.0)]);
        let legs = closed_loop_legs(&GeoPoint::new(0.0, 0.0), &points, &[0, 1, 2]);
        assert_eq!(legs.len(), 4);
    }

    #[test]
    fn test_is_permutation() {
        assert!(is_permutation(&[2, 0, 1], 3));
        assert!(!is_permutation(&[0, 0, 1], 3));
        assert!(!is_permutation(&[0, 3, 1], 3));
        assert!(!is_permutation(&[0, 1], 3));
    }

    #[test]
    fn test_stop_timestamps() {
        let waypoints = vec![Waypoint::at(0.0, 1.0), Waypoint::at(0.0, 2.0)];
        let legs = vec![
            RouteLeg { distance_meters: 0.0, duration_seconds: 100.0 },
            RouteLeg { distance_meters: 0.0, duration_seconds: 200.0 },
            RouteLeg { distance_meters: 0.0, duration_seconds: 300.0 },
        ];
        let options = OptimizeOptions {
            departure_time: Some(1_000),
            service_seconds: 60,
            ..Default::default()
        };
        let route = assemble(&waypoints, &[0, 1], legs, 0.0, 600, RouteStrategy::NearestNeighbor, &options).unwrap();
        assert_eq!(route.ordered_stops[0].arrival_time, Some(1_100));
        assert_eq!(route.ordered_stops[0].departure_time, Some(1_160));
        assert_eq!(route.ordered_stops[1].arrival_time, Some(1_360));
        assert_eq!(route.ordered_stops[1].departure_time, Some(1_420));
    }

    #[test]
    fn test_no_timestamps_without_departure() {
        let waypoints = vec![Waypoint::at(0.0, 1.0)];
        let legs = vec![
            RouteLeg { distance_meters: 1.0, duration_seconds: 1.0 },
            RouteLeg { distance_meters: 1.0, duration_seconds: 1.0 },
        ];
        let route = assemble(&waypoints, &[0], legs, 2.0, 2, RouteStrategy::NearestNeighbor, &OptimizeOptions::default())
            .unwrap();
        assert!(route.ordered_stops[0].arrival_time.is_none());
        assert!(route.ordered_stops[0].departure_time.is_none());
    }
}
