//! In-process job queue with bounded retries.
//!
//! Submitted jobs are buffered in a tokio channel and executed by a single
//! worker task, each job in its own task so a slow retry does not hold up
//! the others.

use async_trait::async_trait;
use domain::services::{Job, JobError, JobSubmitter};
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, warn};

use crate::config::JobsConfig;

/// Executes a single job attempt.
#[async_trait]
pub trait JobRunner: Send + Sync {
    /// Run the job once. Err triggers a retry while attempts remain.
    async fn run(&self, job: &Job) -> Result<(), String>;
}

/// How often and how patiently a failing job is retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts per job, including the first one.
    pub max_attempts: u32,
    /// Delay before the second attempt; doubled for each further attempt.
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &JobsConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: Duration::from_millis(config.backoff_ms),
        }
    }

    /// Delay after the given failed attempt (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Handle used by request handlers to enqueue jobs.
#[derive(Clone)]
pub struct QueueSubmitter {
    sender: mpsc::Sender<Job>,
}

#[async_trait]
impl JobSubmitter for QueueSubmitter {
    async fn submit(&self, job: Job) -> Result<(), JobError> {
        let name = job.name();
        self.sender.send(job).await.map_err(|_| JobError::QueueClosed)?;
        counter!("jobs_submitted_total", "job" => name).increment(1);
        Ok(())
    }
}

/// Owns the worker task.
pub struct JobQueue {
    sender: mpsc::Sender<Job>,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl JobQueue {
    /// Spawn the worker. Must be called inside a tokio runtime.
    pub fn start<R: JobRunner + 'static>(runner: R, config: &JobsConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.queue_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let policy = RetryPolicy::from_config(config);

        info!(
            capacity = config.queue_capacity,
            max_attempts = policy.max_attempts,
            "Starting job queue"
        );

        let handle = tokio::spawn(worker_loop(Arc::new(runner), receiver, shutdown_rx, policy));

        Self {
            sender,
            shutdown_tx,
            handle,
        }
    }

    pub fn submitter(&self) -> QueueSubmitter {
        QueueSubmitter {
            sender: self.sender.clone(),
        }
    }

    /// Stop accepting jobs, finish the queued ones and wait up to `timeout`.
    pub async fn shutdown(self, timeout: Duration) {
        info!("Initiating job queue shutdown");
        let _ = self.shutdown_tx.send(true);

        match tokio::time::timeout(timeout, self.handle).await {
            Ok(Ok(())) => info!("Job queue drained"),
            Ok(Err(e)) => warn!("Job worker panicked: {}", e),
            Err(_) => warn!("Job queue shutdown timed out after {:?}", timeout),
        }
    }
}

async fn worker_loop(
    runner: Arc<dyn JobRunner>,
    mut receiver: mpsc::Receiver<Job>,
    mut shutdown_rx: watch::Receiver<bool>,
    policy: RetryPolicy,
) {
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            next = receiver.recv() => match next {
                Some(job) => {
                    let runner = Arc::clone(&runner);
                    in_flight.spawn(async move { run_with_retries(runner.as_ref(), job, policy).await });
                }
                None => break,
            },
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break;
                }
            }
        }
    }

    // Jobs accepted before shutdown still run.
    receiver.close();
    while let Some(job) = receiver.recv().await {
        let runner = Arc::clone(&runner);
        in_flight.spawn(async move { run_with_retries(runner.as_ref(), job, policy).await });
    }
    while in_flight.join_next().await.is_some() {}
}

/// Runs `job` until it succeeds or the attempts are exhausted.
/// Returns whether it eventually succeeded.
pub(crate) async fn run_with_retries(runner: &dyn JobRunner, job: Job, policy: RetryPolicy) -> bool {
    let name = job.name();

    for attempt in 1..=policy.max_attempts {
        let start = std::time::Instant::now();
        match runner.run(&job).await {
            Ok(()) => {
                info!(
                    job = name,
                    attempt,
                    elapsed_ms = start.elapsed().as_millis(),
                    "Job completed successfully"
                );
                counter!("jobs_completed_total", "job" => name).increment(1);
                return true;
            }
            Err(e) if attempt < policy.max_attempts => {
                let delay = policy.delay_after(attempt);
                warn!(
                    job = name,
                    attempt,
                    retry_in_ms = delay.as_millis(),
                    error = %e,
                    "Job failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                error!(job = name, attempt, error = %e, "Job failed, giving up");
            }
        }
    }

    counter!("jobs_failed_total", "job" => name).increment(1);
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use uuid::Uuid;

    struct FlakyRunner {
        failures_before_success: u32,
        attempts: Arc<AtomicU32>,
    }

    #[async_trait]
    impl JobRunner for FlakyRunner {
        async fn run(&self, _job: &Job) -> Result<(), String> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
            if attempt <= self.failures_before_success {
                Err(format!("attempt {} failed", attempt))
            } else {
                Ok(())
            }
        }
    }

    fn job() -> Job {
        Job::SendConfirmationEmail {
            user_id: Uuid::new_v4(),
        }
    }

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(1),
        }
    }

    fn test_jobs_config() -> JobsConfig {
        JobsConfig {
            queue_capacity: 4,
            max_attempts: 3,
            backoff_ms: 1,
        }
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            max_attempts: 3,
            backoff: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_after(1), Duration::from_millis(100));
        assert_eq!(policy.delay_after(2), Duration::from_millis(200));
        assert_eq!(policy.delay_after(3), Duration::from_millis(400));
    }

    #[test]
    fn test_policy_never_drops_below_one_attempt() {
        let config = JobsConfig {
            max_attempts: 0,
            ..test_jobs_config()
        };
        assert_eq!(RetryPolicy::from_config(&config).max_attempts, 1);
    }

    #[tokio::test]
    async fn test_job_succeeds_after_retries() {
        let attempts = Arc::new(AtomicU32::new(0));
        let runner = FlakyRunner {
            failures_before_success: 2,
            attempts: Arc::clone(&attempts),
        };

        assert!(run_with_retries(&runner, job(), policy()).await);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_job_gives_up_after_max_attempts() {
        let attempts = Arc::new(AtomicU32::new(0));
        let runner = FlakyRunner {
            failures_before_success: u32::MAX,
            attempts: Arc::clone(&attempts),
        };

        assert!(!run_with_retries(&runner, job(), policy()).await);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_queue_runs_submitted_jobs_before_shutdown() {
        let attempts = Arc::new(AtomicU32::new(0));
        let queue = JobQueue::start(
            FlakyRunner {
                failures_before_success: 0,
                attempts: Arc::clone(&attempts),
            },
            &test_jobs_config(),
        );

        let submitter = queue.submitter();
        submitter.submit(job()).await.unwrap();
        submitter.submit(job()).await.unwrap();

        queue.shutdown(Duration::from_secs(2)).await;
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_fails() {
        let queue = JobQueue::start(
            FlakyRunner {
                failures_before_success: 0,
                attempts: Arc::new(AtomicU32::new(0)),
            },
            &test_jobs_config(),
        );
        let submitter = queue.submitter();
        queue.shutdown(Duration::from_secs(2)).await;

        let result = submitter.submit(job()).await;
        assert!(matches!(result, Err(JobError::QueueClosed)));
    }
}
