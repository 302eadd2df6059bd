//! dispatch-geo: distance matrices and single-vehicle route ordering
//!
//! Straight-line computations are always available; a mapping web service
//! can be configured for road-network distances and small-route ordering.

pub mod api;
pub mod config;
pub mod error;
pub mod geo;
pub mod haversine;
pub mod matrix;
pub mod metrics;
pub mod optimizer;
pub mod remote;
pub mod traits;
pub mod units;
pub mod validate;

pub use api::{DispatchEngine, Request, Response};
pub use config::{ConfigError, EngineConfig, FailurePolicy};
pub use error::{DispatchError, ProviderFailure};
pub use geo::{GeoPoint, Waypoint};
