//! Domain layer for the Comparte Ride backend.
//!
//! This crate contains:
//! - Domain models (User, Circle, Membership, Invitation, Ride, Rating)
//! - Lifecycle rules and authorization predicates
//! - Domain error types

pub mod error;
pub mod models;
pub mod services;

pub use error::DomainError;
