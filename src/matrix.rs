//! Distance matrix orchestration.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::FailurePolicy;
use crate::error::{DispatchError, Operation, ProviderFailure, Result};
use crate::geo::GeoPoint;
use crate::haversine::LocalHaversineProvider;
use crate::traits::{DistanceProvider, DistanceResult, MatrixOptions};
use crate::validate;

/// Row-major matrix results plus which provider produced them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatrixOutcome {
    pub results: Vec<DistanceResult>,
    /// Provider name; `haversine-fallback` when a remote failure was absorbed.
    pub provider: &'static str,
}

/// Computes every origin/destination pair with the selected provider.
///
/// A configured remote provider receives the whole batch in one call.
#[derive(Clone)]
pub struct DistanceMatrixService {
    local: LocalHaversineProvider,
    remote: Option<Arc<dyn DistanceProvider>>,
    failure_policy: FailurePolicy,
}

impl DistanceMatrixService {
    pub fn local(local: LocalHaversineProvider) -> Self {
        Self {
            local,
            remote: None,
            failure_policy: FailurePolicy::Fail,
        }
    }

    pub fn with_remote(
        local: LocalHaversineProvider,
        remote: Arc<dyn DistanceProvider>,
        failure_policy: FailurePolicy,
    ) -> Self {
        Self {
            local,
            remote: Some(remote),
            failure_policy,
        }
    }

    pub fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    pub async fn compute_matrix(
        &self,
        origins: &[GeoPoint],
        destinations: &[GeoPoint],
        options: &MatrixOptions,
        cancel: &CancellationToken,
    ) -> Result<MatrixOutcome> {
        validate::matrix_request(origins, destinations)?;

        let Some(remote) = &self.remote else {
            debug!(pairs = origins.len() * destinations.len(), "computing matrix locally");
            return Ok(MatrixOutcome {
                results: self.local.compute(origins, destinations, options),
                provider: "haversine",
            });
        };

        let outcome = run_cancellable(cancel, remote.matrix(origins, destinations, options)).await;
        match outcome {
            Ok(results) => {
                let expected = origins.len() * destinations.len();
                if results.len() != expected {
                    return Err(DispatchError::Provider {
                        provider: remote.name(),
                        operation: Operation::Matrix,
                        failure: ProviderFailure::InvalidResponse(format!(
                            "expected {} results, got {}",
                            expected,
                            results.len()
                        )),
                    });
                }
                Ok(MatrixOutcome {
                    results,
                    provider: remote.name(),
                })
            }
            Err(failure) => {
                if self.failure_policy == FailurePolicy::FallbackToLocal && failure != ProviderFailure::Cancelled {
                    warn!(
                        provider = remote.name(),
                        error = %failure,
                        "remote matrix failed, falling back to local haversine"
                    );
                    return Ok(MatrixOutcome {
                        results: self.local.compute(origins, destinations, options),
                        provider: "haversine-fallback",
                    });
                }
                Err(DispatchError::Provider {
                    provider: remote.name(),
                    operation: Operation::Matrix,
                    failure,
                })
            }
        }
    }
}

/// Race a provider call against cancellation; the call is dropped if cancelled.
pub(crate) async fn run_cancellable<T, F>(cancel: &CancellationToken, call: F) -> std::result::Result<T, ProviderFailure>
where
    F: Future<Output = std::result::Result<T, ProviderFailure>>,
{
    if cancel.is_cancelled() {
        return Err(ProviderFailure::Cancelled);
    }
    tokio::select! {
        _ = cancel.cancelled() => Err(ProviderFailure::Cancelled),
        result = call => result,
    }
}
