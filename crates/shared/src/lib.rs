//! Shared utilities and common types for the Comparte Ride backend.
//!
//! This crate provides common functionality used across all other crates:
//! - JWT access and verification tokens
//! - Password hashing with Argon2id
//! - Common validation logic
//! - Pagination helpers

pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;
