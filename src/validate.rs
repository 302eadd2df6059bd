//! Bounds checks run before any computation.
//!
//! Every problem is collected so callers see all offending fields at once.

use crate::error::{DispatchError, FieldError};
use crate::geo::{GeoPoint, Waypoint};

pub const MAX_ORIGINS: usize = 25;
pub const MAX_DESTINATIONS: usize = 25;
pub const MAX_WAYPOINTS: usize = 20;
pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 5;

#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn point(&mut self, field: &str, point: &GeoPoint) {
        if !point.latitude.is_finite() || !(-90.0..=90.0).contains(&point.latitude) {
            self.push(format!("{}.latitude", field), "must be a number between -90 and 90");
        }
        if !point.longitude.is_finite() || !(-180.0..=180.0).contains(&point.longitude) {
            self.push(format!("{}.longitude", field), "must be a number between -180 and 180");
        }
    }

    pub fn points(&mut self, field: &str, points: &[GeoPoint], max: usize) {
        self.count(field, points.len(), max);
        for (i, point) in points.iter().enumerate() {
            self.point(&format!("{}[{}]", field, i), point);
        }
    }

    pub fn waypoints(&mut self, field: &str, waypoints: &[Waypoint]) {
        self.count(field, waypoints.len(), MAX_WAYPOINTS);
        for (i, waypoint) in waypoints.iter().enumerate() {
            let path = format!("{}[{}]", field, i);
            self.point(&path, &waypoint.point);
            if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&waypoint.priority) {
                self.push(
                    format!("{}.priority", path),
                    format!("must be between {} and {}", MIN_PRIORITY, MAX_PRIORITY),
                );
            }
            if let Some(window) = waypoint.time_window {
                if window.start > window.end {
                    self.push(format!("{}.timeWindow", path), "start must not be after end");
                }
            }
        }
    }

    pub fn positive(&mut self, field: &str, value: Option<f64>) {
        if let Some(value) = value {
            if !value.is_finite() || value <= 0.0 {
                self.push(field, "must be a positive number");
            }
        }
    }

    fn count(&mut self, field: &str, len: usize, max: usize) {
        if len == 0 {
            self.push(field, "at least one entry is required");
        } else if len > max {
            self.push(field, format!("at most {} entries allowed, got {}", max, len));
        }
    }

    pub fn finish(self) -> Result<(), DispatchError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(DispatchError::Validation(self.errors))
        }
    }
}

pub fn matrix_request(origins: &[GeoPoint], destinations: &[GeoPoint]) -> Result<(), DispatchError> {
    let mut validator = Validator::new();
    validator.points("origins", origins, MAX_ORIGINS);
    validator.points("destinations", destinations, MAX_DESTINATIONS);
    validator.finish()
}

pub fn optimize_request(depot: &GeoPoint, waypoints: &[Waypoint]) -> Result<(), DispatchError> {
    let mut validator = Validator::new();
    validator.point("depot", depot);
    validator.waypoints("waypoints", waypoints);
    validator.finish()
}
