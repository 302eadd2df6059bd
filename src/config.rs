//! Engine configuration and provider selection.

use thiserror::Error;

use crate::geo::DEFAULT_SPEED_KMH;
use crate::remote::{RemoteConfig, DEFAULT_BASE_URL};

/// Waypoint count up to which route ordering is delegated to the remote provider.
pub const DEFAULT_REMOTE_ROUTE_MAX_WAYPOINTS: usize = 8;

/// What to do when a configured remote provider fails at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Surface the failure as a provider error.
    #[default]
    Fail,
    /// Recompute locally and mark the response as a fallback.
    FallbackToLocal,
}

impl FailurePolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fail" => Some(FailurePolicy::Fail),
            "fallback-local" | "fallback_local" | "fallback" => Some(FailurePolicy::FallbackToLocal),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Remote mapping provider; `None` means every computation is local.
    pub remote: Option<RemoteConfig>,
    pub failure_policy: FailurePolicy,
    pub remote_route_max_waypoints: usize,
    /// Speed assumed by the local provider's duration estimates.
    pub average_speed_kmh: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            remote: None,
            failure_policy: FailurePolicy::Fail,
            remote_route_max_waypoints: DEFAULT_REMOTE_ROUTE_MAX_WAYPOINTS,
            average_speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has invalid value `{value}`: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("failed to build remote provider client: {0}")]
    Client(String),
}

impl From<reqwest::Error> for ConfigError {
    fn from(err: reqwest::Error) -> Self {
        ConfigError::Client(err.without_url().to_string())
    }
}

impl EngineConfig {
    /// Load configuration from environment variables (and a `.env` file if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = EngineConfig::default();

        let api_key = lookup("MAPS_API_KEY").filter(|key| !key.trim().is_empty());
        if let Some(api_key) = api_key {
            let mut remote = RemoteConfig::new(api_key.trim());
            remote.base_url = lookup("MAPS_BASE_URL")
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
            if let Some(raw) = lookup("MAPS_TIMEOUT_SECS") {
                remote.timeout_secs = match raw.trim().parse::<u64>() {
                    Ok(secs) if secs > 0 => secs,
                    _ => {
                        return Err(ConfigError::Invalid {
                            var: "MAPS_TIMEOUT_SECS",
                            value: raw.clone(),
                            reason: "expected a positive integer",
                        });
                    }
                };
            }
            config.remote = Some(remote);
        }

        if let Some(raw) = lookup("ROUTE_PROVIDER_FAILURE_POLICY") {
            config.failure_policy = FailurePolicy::parse(&raw).ok_or(ConfigError::Invalid {
                var: "ROUTE_PROVIDER_FAILURE_POLICY",
                value: raw.clone(),
                reason: "expected `fail` or `fallback-local`",
            })?;
        }

        if let Some(raw) = lookup("ROUTE_REMOTE_MAX_WAYPOINTS") {
            config.remote_route_max_waypoints = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: "ROUTE_REMOTE_MAX_WAYPOINTS",
                value: raw.clone(),
                reason: "expected a non-negative integer",
            })?;
        }

        Ok(config)
    }
}
