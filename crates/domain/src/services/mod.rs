//! Domain services for Comparte Ride.
//!
//! Services contain the lifecycle rules that operate on domain models.

pub mod circles;
pub mod invitations;
pub mod jobs;
pub mod policy;
pub mod rides;

pub use jobs::{Job, JobError, JobSubmitter, MockJobSubmitter, MAX_JOB_RETRIES};
