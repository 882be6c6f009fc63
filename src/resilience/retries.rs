//! Deferred retry of side-effecting calls.
//!
//! # Responsibilities
//! - Accept jobs from any request handler without blocking it
//! - Run queued jobs one at a time on a single dispatcher task
//! - Put failed jobs back on the queue after a fixed interval
//!
//! # Design Decisions
//! - Delivery is at-least-once, unordered and unbounded: there is no attempt
//!   cap, no dead-letter queue and no backoff growth
//! - Re-enqueue happens from a detached timer task, so a failing job never
//!   blocks the dispatcher from trying other queued jobs
//! - Jobs cannot be withdrawn once submitted and their errors never reach a
//!   client; they are only logged and retried
//! - Producers only append to the queue (MPSC channel); the dispatcher is the
//!   sole consumer

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use crate::observability::metrics;

/// Error returned by a failed job attempt.
pub type JobError = Box<dyn std::error::Error + Send + Sync>;

/// A deferred, retryable unit of side-effecting work.
#[async_trait]
pub trait Job: Send + Sync {
    /// Stable label for logs and metrics (e.g. `rating-update`).
    fn kind(&self) -> &'static str;

    /// What the job targets, for logs.
    fn describe(&self) -> String;

    /// Attempt the work once.
    async fn attempt(&self) -> Result<(), JobError>;
}

struct QueuedJob {
    id: Uuid,
    attempt: u32,
    job: Box<dyn Job>,
}

/// Producer handle; cheap to clone and share across handlers.
#[derive(Clone)]
pub struct RetryScheduler {
    tx: mpsc::UnboundedSender<QueuedJob>,
    submitted: Arc<AtomicU64>,
}

impl RetryScheduler {
    /// Create the queue and its dispatcher. The dispatcher does nothing
    /// until [`RetryDispatcher::run`] is spawned.
    pub fn new(interval: Duration) -> (Self, RetryDispatcher) {
        let (tx, rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            tx: tx.clone(),
            submitted: Arc::new(AtomicU64::new(0)),
        };
        let dispatcher = RetryDispatcher { rx, tx, interval };
        (scheduler, dispatcher)
    }

    /// Enqueue a job and return its id without waiting for execution.
    pub fn submit<J: Job + 'static>(&self, job: J) -> Uuid {
        let id = Uuid::new_v4();
        tracing::info!(job_id = %id, kind = job.kind(), target = %job.describe(), "Deferred job submitted");

        let queued = QueuedJob {
            id,
            attempt: 0,
            job: Box::new(job),
        };
        if self.tx.send(queued).is_err() {
            tracing::error!(job_id = %id, "Retry dispatcher is gone, job dropped");
        } else {
            self.submitted.fetch_add(1, Ordering::Relaxed);
            metrics::record_retry_job("submitted");
        }
        id
    }

    /// Number of jobs accepted since startup.
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }
}

/// The single consumer of the retry queue.
pub struct RetryDispatcher {
    rx: mpsc::UnboundedReceiver<QueuedJob>,
    tx: mpsc::UnboundedSender<QueuedJob>,
    interval: Duration,
}

impl RetryDispatcher {
    /// Pull and run jobs until shutdown is signalled.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval = ?self.interval, "Retry dispatcher starting");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("Retry dispatcher received shutdown signal, exiting loop");
                    break;
                }
                next = self.rx.recv() => match next {
                    Some(queued) => self.dispatch(queued).await,
                    None => break,
                },
            }
        }
    }

    async fn dispatch(&self, mut queued: QueuedJob) {
        queued.attempt += 1;

        match queued.job.attempt().await {
            Ok(()) => {
                tracing::info!(
                    job_id = %queued.id,
                    kind = queued.job.kind(),
                    attempt = queued.attempt,
                    "Deferred job succeeded"
                );
                metrics::record_retry_job("succeeded");
            }
            Err(e) => {
                tracing::warn!(
                    job_id = %queued.id,
                    kind = queued.job.kind(),
                    attempt = queued.attempt,
                    error = %e,
                    retry_in = ?self.interval,
                    "Deferred job failed"
                );
                metrics::record_retry_job("failed");

                let tx = self.tx.clone();
                let interval = self.interval;
                tokio::spawn(async move {
                    tokio::time::sleep(interval).await;
                    let id = queued.id;
                    if tx.send(queued).is_err() {
                        tracing::error!(job_id = %id, "Retry dispatcher is gone, job dropped");
                    }
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::time::Instant;

    const INTERVAL: Duration = Duration::from_secs(10);

    /// Fails `failures` times, then succeeds; records when it ran.
    struct Flaky {
        failures: u32,
        runs: Arc<Mutex<Vec<Instant>>>,
    }

    impl Flaky {
        fn new(failures: u32) -> (Self, Arc<Mutex<Vec<Instant>>>) {
            let runs = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    failures,
                    runs: runs.clone(),
                },
                runs,
            )
        }
    }

    #[async_trait]
    impl Job for Flaky {
        fn kind(&self) -> &'static str {
            "flaky"
        }

        fn describe(&self) -> String {
            format!("fails {} times", self.failures)
        }

        async fn attempt(&self) -> Result<(), JobError> {
            let mut runs = self.runs.lock().unwrap();
            runs.push(Instant::now());
            if runs.len() as u32 <= self.failures {
                Err("backend down".into())
            } else {
                Ok(())
            }
        }
    }

    fn spawn(dispatcher: RetryDispatcher) -> broadcast::Sender<()> {
        let (shutdown, rx) = broadcast::channel(1);
        tokio::spawn(dispatcher.run(rx));
        shutdown
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_does_not_wait_for_execution() {
        let (scheduler, _dispatcher) = RetryScheduler::new(INTERVAL);
        let (job, runs) = Flaky::new(0);

        scheduler.submit(job);

        assert_eq!(scheduler.submitted(), 1);
        assert!(runs.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_job_retried_at_fixed_interval() {
        let (scheduler, dispatcher) = RetryScheduler::new(INTERVAL);
        let _shutdown = spawn(dispatcher);
        let (job, runs) = Flaky::new(u32::MAX);

        scheduler.submit(job);
        tokio::time::sleep(Duration::from_secs(35)).await;

        let runs = runs.lock().unwrap();
        assert!(runs.len() >= 3, "expected repeated attempts, got {}", runs.len());
        for pair in runs.windows(2) {
            assert!(pair[1] - pair[0] >= INTERVAL);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_stops_after_success() {
        let (scheduler, dispatcher) = RetryScheduler::new(INTERVAL);
        let _shutdown = spawn(dispatcher);
        let (job, runs) = Flaky::new(2);

        scheduler.submit(job);
        tokio::time::sleep(Duration::from_secs(100)).await;

        assert_eq!(runs.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_job_does_not_block_queue() {
        let (scheduler, dispatcher) = RetryScheduler::new(INTERVAL);
        let _shutdown = spawn(dispatcher);
        let (stuck, _) = Flaky::new(u32::MAX);
        let (healthy, healthy_runs) = Flaky::new(0);

        scheduler.submit(stuck);
        scheduler.submit(healthy);
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(healthy_runs.lock().unwrap().len(), 1);
        assert_eq!(scheduler.submitted(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatcher_exits_on_shutdown() {
        let (scheduler, dispatcher) = RetryScheduler::new(INTERVAL);
        let (shutdown, rx) = broadcast::channel(1);
        let handle = tokio::spawn(dispatcher.run(rx));

        shutdown.send(()).unwrap();
        handle.await.unwrap();

        let (job, runs) = Flaky::new(0);
        scheduler.submit(job);
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(runs.lock().unwrap().is_empty());
    }
}
