//! Human-readable distance and duration text, in the style mapping providers use.

use serde::{Deserialize, Serialize};

const METERS_PER_MILE: f64 = 1609.344;
const FEET_PER_METER: f64 = 3.280_84;

/// Unit system for the `text` fields of a distance result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

impl UnitSystem {
    pub const ALL: [UnitSystem; 2] = [UnitSystem::Metric, UnitSystem::Imperial];

    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Metric => "metric",
            UnitSystem::Imperial => "imperial",
        }
    }
}

pub fn distance_text(meters: u64, units: UnitSystem) -> String {
    match units {
        UnitSystem::Metric => {
            if meters < 1000 {
                format!("{} m", meters)
            } else {
                format!("{:.1} km", meters as f64 / 1000.0)
            }
        }
        UnitSystem::Imperial => {
            let miles = meters as f64 / METERS_PER_MILE;
            if miles < 0.1 {
                format!("{} ft", (meters as f64 * FEET_PER_METER).round() as u64)
            } else {
                format!("{:.1} mi", miles)
            }
        }
    }
}

pub fn duration_text(seconds: u64) -> String {
    if seconds == 0 {
        return "0 mins".to_string();
    }

    // Anything under a minute still reads as "1 min".
    let total_minutes = ((seconds as f64) / 60.0).round().max(1.0) as u64;
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes % (24 * 60)) / 60;
    let minutes = total_minutes % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(plural(days, "day"));
    }
    if hours > 0 {
        parts.push(plural(hours, "hour"));
    }
    if minutes > 0 && days == 0 {
        parts.push(plural(minutes, "min"));
    }
    parts.join(" ")
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("1 {}", unit)
    } else {
        format!("{} {}s", count, unit)
    }
}
