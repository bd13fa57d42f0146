//! Persistence layer for the Comparte Ride backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations, including the transactional lifecycle
//!   operations (circle creation, invitation redemption, ride joins)
//! - Query metrics

pub mod db;
pub mod entities;
pub mod error;
pub mod metrics;
pub mod repositories;

pub use error::LifecycleError;
