//! Fan-out dispatch and aggregation.
//!
//! The manager owns one admission guard per endpoint plus the worker pool(s)
//! chosen by [`PoolMode`], dispatches one task per eligible endpoint and
//! merges the task outcomes into one combined result.

use std::collections::HashSet;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::config::{PoolConfig, PoolMode};
use crate::endpoint::{EndpointError, Parameters, ServiceEndpoint};
use crate::guard::{AdmissionError, InvocationGuard};
use crate::pool::WorkerPool;
use crate::selector;

/// Terminal failure of one dispatched task.
#[derive(Debug, thiserror::Error)]
pub enum InvokeError {
    /// The endpoint's own invocation raised a domain error.
    #[error("Endpoint '{name}' failed: {source}")]
    Endpoint {
        name: String,
        #[source]
        source: EndpointError,
    },

    /// The task was cancelled before producing an outcome, either while
    /// waiting for admission or because its pool shut down underneath it.
    #[error("Invocation of endpoint '{name}' cancelled")]
    Cancelled { name: String },
}

impl InvokeError {
    /// Name of the endpoint the failed task was dispatched to.
    pub fn endpoint_name(&self) -> &str {
        match self {
            Self::Endpoint { name, .. } | Self::Cancelled { name } => name,
        }
    }
}

/// Combined outcome of one fan-out call.
///
/// [`ServiceManager::invoke`] never fails outright. When aggregation aborts
/// early, the partial items gathered so far are returned together with the
/// first failure observed, so callers can tell a complete result from an
/// aborted one without reading logs.
#[derive(Debug)]
pub struct InvokeOutcome<T> {
    /// Merged result items. Cross-endpoint order is unspecified; the items
    /// of one successful task are contiguous and in endpoint order.
    pub items: Vec<T>,
    /// First failure observed, if aggregation aborted early.
    pub aborted: Option<InvokeError>,
}

impl<T> InvokeOutcome<T> {
    /// True when every dispatched task resolved successfully.
    pub fn is_complete(&self) -> bool {
        self.aborted.is_none()
    }

    /// Consume the outcome, keeping only the merged items.
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

/// One endpoint with the admission guard and pool serving it.
struct GuardedEndpoint<T> {
    endpoint: Arc<dyn ServiceEndpoint<T>>,
    supported: HashSet<String>,
    guard: Arc<InvocationGuard>,
    pool: Arc<WorkerPool>,
}

/// Fan-out/aggregation engine over a fixed endpoint collection.
///
/// Guards and pools are built eagerly at construction and owned for the
/// manager's lifetime; [`ServiceManager::shutdown`] tears them down. Both
/// provisioning strategies run through the same dispatch path:
///
/// - [`PoolMode::Centralized`]: every endpoint shares one pool, so total
///   in-flight work is bounded across endpoints in addition to each
///   endpoint's own guard.
/// - [`PoolMode::Decentralized`]: each endpoint gets a dedicated pool, so
///   load on one endpoint cannot block submission to another.
pub struct ServiceManager<T> {
    endpoints: Vec<GuardedEndpoint<T>>,
    pools: Vec<Arc<WorkerPool>>,
}

impl<T: Send + 'static> ServiceManager<T> {
    /// Build a manager over `endpoints` with pools provisioned per `config`.
    ///
    /// Reads each endpoint's supported parameter names and concurrency
    /// ceiling once, here; endpoints must keep both stable afterwards.
    pub fn new(endpoints: Vec<Arc<dyn ServiceEndpoint<T>>>, config: &PoolConfig) -> Self {
        let mut pools = Vec::new();
        let shared = match config.mode {
            PoolMode::Centralized => {
                let pool = Arc::new(WorkerPool::new(config.workers, config.queue_capacity));
                pools.push(Arc::clone(&pool));
                Some(pool)
            }
            PoolMode::Decentralized => None,
        };

        let endpoints: Vec<_> = endpoints
            .into_iter()
            .map(|endpoint| {
                let pool = match &shared {
                    Some(pool) => Arc::clone(pool),
                    None => {
                        let pool = Arc::new(WorkerPool::new(
                            config.workers_per_endpoint,
                            config.queue_capacity,
                        ));
                        pools.push(Arc::clone(&pool));
                        pool
                    }
                };
                let max_concurrent = endpoint.max_concurrent_invocations();
                info!(
                    endpoint.name = %endpoint.name(),
                    endpoint.max_concurrent = max_concurrent,
                    "Registered endpoint"
                );
                GuardedEndpoint {
                    supported: endpoint.supported_parameters(),
                    guard: Arc::new(InvocationGuard::new(max_concurrent)),
                    pool,
                    endpoint,
                }
            })
            .collect();

        Self { endpoints, pools }
    }

    /// Number of endpoints under management.
    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    /// Fan out `parameters` to every eligible endpoint and merge the results.
    ///
    /// One task is dispatched per endpoint whose supported names cover the
    /// request; each task passes through its endpoint's guard before
    /// invoking. Outcomes are awaited in completion order. The first failure
    /// observed aborts aggregation: the partial items gathered so far are
    /// returned, and tasks still in flight are abandoned rather than
    /// cancelled: they run to completion on their pool and their outcomes
    /// are discarded.
    pub async fn invoke(&self, parameters: &Parameters) -> InvokeOutcome<T> {
        let mut pending = FuturesUnordered::new();

        for entry in &self.endpoints {
            if !selector::matches(&entry.supported, parameters) {
                continue;
            }

            let name = entry.endpoint.name().to_string();
            let endpoint = Arc::clone(&entry.endpoint);
            let guard = Arc::clone(&entry.guard);
            let parameters = parameters.clone();
            let (outcome_tx, outcome_rx) = oneshot::channel();

            let job = async move {
                let outcome = Self::run_task(endpoint, guard, parameters).await;
                // The receiver is gone if aggregation already aborted; the
                // outcome is discarded in that case.
                let _ = outcome_tx.send(outcome);
            }
            .boxed();

            match entry.pool.submit(job).await {
                Ok(()) => pending.push(async move { (name, outcome_rx.await) }),
                Err(e) => {
                    error!(endpoint.name = %name, error = %e, "Task submission failed");
                    return InvokeOutcome {
                        items: Vec::new(),
                        aborted: Some(InvokeError::Cancelled { name }),
                    };
                }
            }
        }

        let mut items = Vec::new();
        while let Some((name, resolved)) = pending.next().await {
            match resolved {
                Ok(Ok(mut batch)) => items.append(&mut batch),
                Ok(Err(e)) => {
                    error!(
                        endpoint.name = %name,
                        error = %e,
                        "Invocation failed, aborting aggregation"
                    );
                    return InvokeOutcome {
                        items,
                        aborted: Some(e),
                    };
                }
                Err(_) => {
                    // Sender dropped without an outcome: the pool shut down
                    // before the task ran.
                    error!(endpoint.name = %name, "Task abandoned before completion");
                    return InvokeOutcome {
                        items,
                        aborted: Some(InvokeError::Cancelled { name }),
                    };
                }
            }
        }

        InvokeOutcome {
            items,
            aborted: None,
        }
    }

    /// Task body shared by both provisioning strategies: admit, invoke,
    /// release (on drop of the permit, on every exit path).
    async fn run_task(
        endpoint: Arc<dyn ServiceEndpoint<T>>,
        guard: Arc<InvocationGuard>,
        parameters: Parameters,
    ) -> Result<Vec<T>, InvokeError> {
        let _permit = match guard.admit().await {
            Ok(permit) => permit,
            Err(AdmissionError::Cancelled) => {
                return Err(InvokeError::Cancelled {
                    name: endpoint.name().to_string(),
                })
            }
        };

        endpoint
            .invoke(&parameters)
            .await
            .map_err(|source| InvokeError::Endpoint {
                name: endpoint.name().to_string(),
                source,
            })
    }

    /// Tear down the manager: close every guard and join every pool worker.
    ///
    /// Tasks still waiting for admission resolve to cancellation; jobs
    /// already queued or running finish before the workers exit. An
    /// invocation that never returns will block shutdown, since the engine
    /// applies no timeout.
    pub async fn shutdown(self) {
        for entry in &self.endpoints {
            entry.guard.close();
        }
        for pool in &self.pools {
            pool.shutdown().await;
        }
        info!("Service manager shut down");
    }
}
