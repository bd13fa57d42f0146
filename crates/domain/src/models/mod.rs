//! Domain models for Comparte Ride.

pub mod circle;
pub mod invitation;
pub mod membership;
pub mod rating;
pub mod ride;
pub mod user;

pub use circle::Circle;
pub use invitation::Invitation;
pub use membership::Membership;
pub use rating::Rating;
pub use ride::{Ride, RideState};
pub use user::{Profile, User, UserSummary};
