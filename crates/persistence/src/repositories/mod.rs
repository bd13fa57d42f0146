//! Repository implementations for database operations.

pub mod circle;
pub mod invitation;
pub mod membership;
pub mod ride;
pub mod user;

pub use circle::{CircleChanges, CircleRepository, NewCircle};
pub use invitation::{HeldInvitations, InvitationRepository};
pub use membership::{MembershipRepository, RideCounter};
pub use ride::{NewRide, RideRepository};
pub use user::{NewUser, UserRepository};
