//! HTTP route handlers.

pub mod circles;
pub mod health;
pub mod memberships;
pub mod rides;
pub mod users;
