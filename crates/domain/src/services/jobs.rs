//! Asynchronous job submission.
//!
//! Lifecycle operations hand side work (such as verification email) to a
//! [`JobSubmitter`] and never wait for it to run.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

/// Retry budget for a failing job.
pub const MAX_JOB_RETRIES: u32 = 3;

/// Work that runs outside the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Job {
    /// Email an account verification link to a freshly signed-up user.
    SendConfirmationEmail { user_id: Uuid },
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::SendConfirmationEmail { .. } => "send_confirmation_email",
        }
    }
}

#[derive(Debug, Error)]
pub enum JobError {
    /// The queue no longer accepts jobs (shutting down).
    #[error("Job queue is closed")]
    QueueClosed,

    #[error("Job failed: {0}")]
    Failed(String),
}

/// Fire-and-forget job submission.
#[async_trait::async_trait]
pub trait JobSubmitter: Send + Sync {
    async fn submit(&self, job: Job) -> Result<(), JobError>;
}

/// Records submitted jobs instead of running them.
#[derive(Debug, Clone, Default)]
pub struct MockJobSubmitter {
    submitted: Arc<Mutex<Vec<Job>>>,
    /// Whether to simulate a closed queue for testing.
    pub simulate_failure: bool,
}

impl MockJobSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
            ..Self::default()
        }
    }

    /// Jobs submitted so far.
    pub fn submitted(&self) -> Vec<Job> {
        self.submitted
            .lock()
            .map(|jobs| jobs.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl JobSubmitter for MockJobSubmitter {
    async fn submit(&self, job: Job) -> Result<(), JobError> {
        if self.simulate_failure {
            tracing::warn!(job = job.name(), "Mock job submitter simulating failure");
            return Err(JobError::QueueClosed);
        }

        tracing::info!(job = job.name(), "Mock: Would run job");
        if let Ok(mut jobs) = self.submitted.lock() {
            jobs.push(job);
        }
        Ok(())
    }
}
