//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod circle;
pub mod invitation;
pub mod membership;
pub mod ride;
pub mod user;

pub use circle::CircleEntity;
pub use invitation::InvitationEntity;
pub use membership::{MemberWithUserEntity, MembershipEntity};
pub use ride::{RatingEntity, RideEntity};
pub use user::{ProfileEntity, UserEntity, UserSummaryEntity};
