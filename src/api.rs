//! Request/response boundary: `action`-tagged requests in, typed or JSON replies out.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::{ConfigError, EngineConfig};
use crate::error::{DispatchError, Operation, Result};
use crate::geo::{GeoPoint, Waypoint};
use crate::haversine::LocalHaversineProvider;
use crate::matrix::DistanceMatrixService;
use crate::optimizer::{Objective, OptimizeOptions, OptimizedRoute, RouteOptimizer};
use crate::remote::RemoteMappingProvider;
use crate::traits::{DistanceResult, MatrixOptions, TravelMode};
use crate::units::UnitSystem;
use crate::validate::{Validator, MAX_DESTINATIONS, MAX_ORIGINS, MAX_WAYPOINTS};

pub const ACTIONS: [&str; 3] = ["matrix", "optimize", "capabilities"];

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixRequest {
    pub origins: Vec<GeoPoint>,
    pub destinations: Vec<GeoPoint>,
    #[serde(flatten)]
    pub options: MatrixOptions,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeRequest {
    pub depot: GeoPoint,
    pub waypoints: Vec<Waypoint>,
    /// Reserved: accepted and echoed, not enforced.
    #[serde(default)]
    pub vehicle_capacity: Option<f64>,
    /// Reserved: accepted and echoed, not enforced.
    #[serde(default)]
    pub max_distance: Option<f64>,
    #[serde(default)]
    pub optimize: Objective,
    #[serde(default)]
    pub mode: TravelMode,
    #[serde(default)]
    pub departure_time: Option<i64>,
    #[serde(default)]
    pub service_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Request {
    Matrix(MatrixRequest),
    Optimize(OptimizeRequest),
    Capabilities,
}

impl Request {
    pub fn operation(&self) -> Operation {
        match self {
            Request::Matrix(_) => Operation::Matrix,
            Request::Optimize(_) => Operation::Optimize,
            Request::Capabilities => Operation::Capabilities,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixResponse {
    pub results: Vec<DistanceResult>,
    pub count: usize,
    pub provider: &'static str,
}

/// Constraint fields the engine received but does not apply.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IgnoredConstraints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_capacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeResponse {
    #[serde(flatten)]
    pub route: OptimizedRoute,
    #[serde(skip_serializing_if = "is_empty_constraints")]
    pub ignored_constraints: IgnoredConstraints,
}

fn is_empty_constraints(c: &IgnoredConstraints) -> bool {
    c.vehicle_capacity.is_none() && c.max_distance.is_none()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Limits {
    pub max_origins: usize,
    pub max_destinations: usize,
    pub max_waypoints: usize,
    /// Waypoint count up to which ordering is delegated to the remote provider.
    pub remote_route_max_waypoints: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub actions: Vec<&'static str>,
    pub modes: Vec<TravelMode>,
    pub units: Vec<UnitSystem>,
    pub objectives: Vec<Objective>,
    pub limits: Limits,
    pub remote_provider: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Matrix(MatrixResponse),
    Optimize(OptimizeResponse),
    Capabilities(Capabilities),
}

/// Entry point wiring validation, provider selection and the two services.
#[derive(Clone)]
pub struct DispatchEngine {
    matrix: DistanceMatrixService,
    optimizer: RouteOptimizer,
}

impl DispatchEngine {
    pub fn new(matrix: DistanceMatrixService, optimizer: RouteOptimizer) -> Self {
        Self { matrix, optimizer }
    }

    /// Local-only engine; never performs network I/O.
    pub fn local() -> Self {
        Self::new(
            DistanceMatrixService::local(LocalHaversineProvider::default()),
            RouteOptimizer::local(),
        )
    }

    pub fn from_config(config: &EngineConfig) -> std::result::Result<Self, ConfigError> {
        let local = LocalHaversineProvider::new(config.average_speed_kmh);

        let Some(remote_config) = &config.remote else {
            debug!("no remote mapping provider configured, using haversine only");
            return Ok(Self::new(
                DistanceMatrixService::local(local),
                RouteOptimizer::local().speed_kmh(config.average_speed_kmh),
            ));
        };

        let remote = Arc::new(RemoteMappingProvider::new(remote_config.clone())?);
        debug!(base_url = %remote_config.base_url, "remote mapping provider configured");

        Ok(Self::new(
            DistanceMatrixService::with_remote(local, remote.clone(), config.failure_policy),
            RouteOptimizer::with_remote(remote, config.failure_policy)
                .remote_max_waypoints(config.remote_route_max_waypoints)
                .speed_kmh(config.average_speed_kmh),
        ))
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            actions: ACTIONS.to_vec(),
            modes: TravelMode::ALL.to_vec(),
            units: UnitSystem::ALL.to_vec(),
            objectives: Objective::ALL.to_vec(),
            limits: Limits {
                max_origins: MAX_ORIGINS,
                max_destinations: MAX_DESTINATIONS,
                max_waypoints: MAX_WAYPOINTS,
                remote_route_max_waypoints: self.optimizer.remote_threshold(),
            },
            remote_provider: self.matrix.has_remote() || self.optimizer.has_remote(),
        }
    }

    pub async fn matrix(&self, request: &MatrixRequest, cancel: &CancellationToken) -> Result<MatrixResponse> {
        let outcome = self
            .matrix
            .compute_matrix(&request.origins, &request.destinations, &request.options, cancel)
            .await?;

        Ok(MatrixResponse {
            count: outcome.results.len(),
            results: outcome.results,
            provider: outcome.provider,
        })
    }

    pub async fn optimize(&self, request: &OptimizeRequest, cancel: &CancellationToken) -> Result<OptimizeResponse> {
        let mut validator = Validator::new();
        validator.point("depot", &request.depot);
        validator.waypoints("waypoints", &request.waypoints);
        validator.positive("vehicleCapacity", request.vehicle_capacity);
        validator.positive("maxDistance", request.max_distance);
        validator.finish()?;

        let ignored_constraints = IgnoredConstraints {
            vehicle_capacity: request.vehicle_capacity,
            max_distance: request.max_distance,
        };
        if !is_empty_constraints(&ignored_constraints) {
            debug!(?ignored_constraints, "capacity and distance limits are not enforced");
        }

        let options = OptimizeOptions {
            optimize_for: request.optimize,
            mode: request.mode,
            departure_time: request.departure_time,
            service_seconds: request.service_seconds,
        };
        let route = self
            .optimizer
            .optimize(&request.depot, &request.waypoints, &options, cancel)
            .await?;

        Ok(OptimizeResponse {
            route,
            ignored_constraints,
        })
    }

    pub async fn handle(&self, request: &Request, cancel: &CancellationToken) -> Result<Response> {
        match request {
            Request::Matrix(req) => self.matrix(req, cancel).await.map(Response::Matrix),
            Request::Optimize(req) => self.optimize(req, cancel).await.map(Response::Optimize),
            Request::Capabilities => Ok(Response::Capabilities(self.capabilities())),
        }
    }

    /// Handle a raw JSON body. Returns an HTTP-style status code and a JSON reply.
    pub async fn handle_json(&self, body: &Value, cancel: &CancellationToken) -> (u16, Value) {
        let request = match parse_request(body) {
            Ok(request) => request,
            Err(err) => return error_reply(&err),
        };
        let operation = request.operation();

        let result = self.handle(&request, cancel).await.and_then(|response| {
            serde_json::to_value(&response).map_err(|err| DispatchError::Computation {
                operation,
                message: format!("failed to encode response: {}", err),
            })
        });

        match result {
            Ok(value) => (200, value),
            Err(err) => {
                if !err.is_client_error() {
                    warn!(kind = err.kind(), error = %err, "request failed");
                }
                error_reply(&err)
            }
        }
    }
}

/// Parse an `action`-tagged body, distinguishing unknown actions from bad payloads.
pub fn parse_request(body: &Value) -> Result<Request> {
    let action = match body.get("action") {
        Some(Value::String(action)) => action.as_str(),
        Some(_) => return Err(DispatchError::validation("action", "must be a string")),
        None => return Err(DispatchError::validation("action", "is required")),
    };
    if !ACTIONS.contains(&action) {
        return Err(DispatchError::UnsupportedAction(action.to_string()));
    }

    Request::deserialize(body).map_err(|err| DispatchError::validation("body", err.to_string()))
}

fn error_reply(err: &DispatchError) -> (u16, Value) {
    let mut body = json!({
        "error": err.kind(),
        "message": err.to_string(),
    });
    if let DispatchError::Validation(fields) = err {
        body["fields"] = json!(fields);
    }
    (err.status_code(), body)
}
