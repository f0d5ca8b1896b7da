//! Fixed-size worker pools.
//!
//! A pool is a bounded set of tokio tasks pulling type-erased jobs off a
//! shared queue. Pool size bounds how many jobs run at once; the queue
//! buffers the rest. The engine uses one shared pool (centralized mode) or
//! one pool per endpoint (decentralized mode).

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::debug;

/// A unit of work scheduled on a pool.
pub type Job = BoxFuture<'static, ()>;

/// Errors from pool operations.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    /// The pool has been shut down; no further jobs are accepted.
    #[error("Worker pool closed")]
    Closed,
}

/// Fixed set of workers executing queued jobs.
pub struct WorkerPool {
    /// Job queue sender; taken on shutdown so the queue closes.
    jobs: Mutex<Option<mpsc::Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
}

impl WorkerPool {
    /// Spawn `workers` workers sharing a job queue of `queue_capacity`.
    pub fn new(workers: usize, queue_capacity: usize) -> Self {
        let (jobs, rx) = mpsc::channel::<Job>(queue_capacity.max(1));
        let rx = Arc::new(Mutex::new(rx));

        let worker_count = workers.max(1);
        let workers = (0..worker_count)
            .map(|id| {
                let rx = Arc::clone(&rx);
                tokio::spawn(async move {
                    loop {
                        // The receiver lock is held only while dequeuing;
                        // jobs run outside it so workers execute in parallel.
                        let job = rx.lock().await.recv().await;
                        match job {
                            Some(job) => job.await,
                            None => {
                                debug!(worker = id, "Job queue closed, worker exiting");
                                break;
                            }
                        }
                    }
                })
            })
            .collect();

        Self {
            jobs: Mutex::new(Some(jobs)),
            workers: Mutex::new(workers),
            worker_count,
        }
    }

    /// Queue a job for execution.
    ///
    /// Suspends while the queue is full. Fails once the pool is shut down.
    pub async fn submit(&self, job: Job) -> Result<(), PoolError> {
        let sender = self.jobs.lock().await.clone().ok_or(PoolError::Closed)?;
        sender.send(job).await.map_err(|_| PoolError::Closed)
    }

    /// Number of workers.
    pub fn workers(&self) -> usize {
        self.worker_count
    }

    /// Stop accepting jobs and join every worker.
    ///
    /// Jobs already queued still run to completion before the workers exit.
    /// Idempotent: later calls find nothing left to close or join.
    pub async fn shutdown(&self) {
        drop(self.jobs.lock().await.take());
        let workers = std::mem::take(&mut *self.workers.lock().await);
        for handle in workers {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures::FutureExt;

    #[tokio::test]
    async fn test_jobs_run_to_completion() {
        let pool = WorkerPool::new(2, 16);
        let ran = Arc::new(AtomicUsize::new(0));

        let (done_tx, mut done_rx) = mpsc::channel(8);
        for _ in 0..5 {
            let ran = Arc::clone(&ran);
            let done = done_tx.clone();
            pool.submit(
                async move {
                    ran.fetch_add(1, Ordering::SeqCst);
                    let _ = done.send(()).await;
                }
                .boxed(),
            )
            .await
            .unwrap();
        }

        for _ in 0..5 {
            done_rx.recv().await.unwrap();
        }
        assert_eq!(ran.load(Ordering::SeqCst), 5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_pool_size_bounds_concurrency() {
        let pool = WorkerPool::new(2, 16);
        let current = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (done_tx, mut done_rx) = mpsc::channel(8);
        for _ in 0..6 {
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            let done = done_tx.clone();
            pool.submit(
                async move {
                    let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    current.fetch_sub(1, Ordering::SeqCst);
                    let _ = done.send(()).await;
                }
                .boxed(),
            )
            .await
            .unwrap();
        }

        for _ in 0..6 {
            done_rx.recv().await.unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_worker_count_has_floor_of_one() {
        let pool = WorkerPool::new(0, 4);
        assert_eq!(pool.workers(), 1);
        pool.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_runs_queued_jobs() {
        let pool = WorkerPool::new(1, 16);
        let ran = Arc::new(AtomicUsize::new(0));

        for _ in 0..4 {
            let ran = Arc::clone(&ran);
            pool.submit(
                async move {
                    ran.fetch_add(1, Ordering::SeqCst);
                }
                .boxed(),
            )
            .await
            .unwrap();
        }

        pool.shutdown().await;
        assert_eq!(ran.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_fails() {
        let pool = WorkerPool::new(1, 4);
        pool.shutdown().await;

        let result = pool.submit(async {}.boxed()).await;
        assert!(matches!(result, Err(PoolError::Closed)));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let pool = WorkerPool::new(2, 4);
        pool.shutdown().await;
        pool.shutdown().await;
    }
}
