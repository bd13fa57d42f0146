//! Background job queue and job implementations.

mod confirmation_email;
mod queue;

pub use confirmation_email::AccountJobRunner;
pub use queue::{JobQueue, JobRunner, QueueSubmitter, RetryPolicy};
