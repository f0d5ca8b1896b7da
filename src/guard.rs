//! Per-endpoint admission control.
//!
//! Bounds how many invocations of one endpoint may be in flight at once,
//! independent of how many requests are dispatched to it.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Errors from guard admission.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    /// The guard was closed while the task was waiting for a slot.
    #[error("Admission cancelled: guard closed")]
    Cancelled,
}

/// Admission limiter for one endpoint.
///
/// Wraps a semaphore holding as many permits as the endpoint allows
/// concurrent invocations. Admission yields an RAII permit; dropping it
/// releases the slot exactly once on every exit path.
#[derive(Debug)]
pub struct InvocationGuard {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl InvocationGuard {
    /// Create a guard with `limit` concurrent slots.
    pub fn new(limit: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Wait for a slot.
    ///
    /// Suspends until a slot frees. Fails with [`AdmissionError::Cancelled`]
    /// if the guard is closed while waiting; no slot is consumed in that
    /// case.
    pub async fn admit(&self) -> Result<OwnedSemaphorePermit, AdmissionError> {
        Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| AdmissionError::Cancelled)
    }

    /// Close the guard, waking all waiters with [`AdmissionError::Cancelled`].
    ///
    /// Slots already admitted are unaffected; they release on drop as usual.
    pub fn close(&self) {
        self.semaphore.close();
    }

    /// Number of free slots.
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Configured slot count.
    pub fn limit(&self) -> usize {
        self.limit
    }
}
