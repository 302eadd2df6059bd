//! Error kinds surfaced by the dispatch engine.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Which engine operation was running when an error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Matrix,
    Optimize,
    Capabilities,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Matrix => f.write_str("matrix"),
            Operation::Optimize => f.write_str("optimize"),
            Operation::Capabilities => f.write_str("capabilities"),
        }
    }
}

/// A single invalid input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Path to the offending value, e.g. `waypoints[3].latitude`.
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Failure reported by a distance or route provider.
///
/// Messages never contain request URLs, which carry the provider API key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderFailure {
    #[error("provider returned status {status}{}", detail(.message))]
    Status {
        status: String,
        message: Option<String>,
    },
    #[error("provider responded with HTTP {0}")]
    Http(u16),
    #[error("provider request timed out")]
    Timeout,
    #[error("provider request failed: {0}")]
    Transport(String),
    #[error("provider request was cancelled")]
    Cancelled,
    #[error("provider response was malformed: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ProviderFailure {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return ProviderFailure::Timeout;
        }
        if let Some(status) = err.status() {
            return ProviderFailure::Http(status.as_u16());
        }
        if err.is_decode() {
            return ProviderFailure::InvalidResponse(err.without_url().to_string());
        }
        ProviderFailure::Transport(err.without_url().to_string())
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid request: {}", join_fields(.0))]
    Validation(Vec<FieldError>),
    #[error("unsupported action `{0}`")]
    UnsupportedAction(String),
    #[error("{provider} provider failed during {operation}: {failure}")]
    Provider {
        provider: &'static str,
        operation: Operation,
        #[source]
        failure: ProviderFailure,
    },
    #[error("{operation} computation failed: {message}")]
    Computation {
        operation: Operation,
        message: String,
    },
}

fn detail(message: &Option<String>) -> String {
    message.as_ref().map(|m| format!(": {}", m)).unwrap_or_default()
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl DispatchError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        DispatchError::Validation(vec![FieldError::new(field, message)])
    }

    /// Status code in HTTP terms, for whichever transport fronts the engine.
    pub fn status_code(&self) -> u16 {
        match self {
            DispatchError::Validation(_) => 400,
            DispatchError::UnsupportedAction(_) => 422,
            DispatchError::Provider { .. } => 502,
            DispatchError::Computation { .. } => 500,
        }
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }

    /// Stable machine-readable kind.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::Validation(_) => "validation_error",
            DispatchError::UnsupportedAction(_) => "unsupported_action",
            DispatchError::Provider { .. } => "provider_error",
            DispatchError::Computation { .. } => "computation_error",
        }
    }
}

pub type Result<T, E = DispatchError> = std::result::Result<T, E>;
