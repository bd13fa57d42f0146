//! Membership entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::membership::MembershipDetail;
use domain::models::UserSummary;
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the memberships table.
#[derive(Debug, Clone, FromRow)]
pub struct MembershipEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub circle_id: Uuid,
    pub is_admin: bool,
    pub is_active: bool,
    pub used_invitations: i32,
    pub remaining_invitations: i32,
    pub invited_by: Option<Uuid>,
    pub rides_taken: i32,
    pub rides_offered: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MembershipEntity> for domain::models::Membership {
    fn from(entity: MembershipEntity) -> Self {
        Self {
            id: entity.id,
            user_id: entity.user_id,
            circle_id: entity.circle_id,
            is_admin: entity.is_admin,
            is_active: entity.is_active,
            used_invitations: entity.used_invitations,
            remaining_invitations: entity.remaining_invitations,
            invited_by: entity.invited_by,
            rides_taken: entity.rides_taken,
            rides_offered: entity.rides_offered,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Membership joined with its user and the inviter's username.
#[derive(Debug, Clone, FromRow)]
pub struct MemberWithUserEntity {
    pub id: Uuid,
    pub user_id: Uuid,
    pub circle_id: Uuid,
    pub is_admin: bool,
    pub is_active: bool,
    pub used_invitations: i32,
    pub remaining_invitations: i32,
    pub invited_by: Option<Uuid>,
    pub rides_taken: i32,
    pub rides_offered: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub invited_by_username: Option<String>,
}

impl MemberWithUserEntity {
    /// Plain membership columns.
    pub fn membership(&self) -> domain::models::Membership {
        domain::models::Membership {
            id: self.id,
            user_id: self.user_id,
            circle_id: self.circle_id,
            is_admin: self.is_admin,
            is_active: self.is_active,
            used_invitations: self.used_invitations,
            remaining_invitations: self.remaining_invitations,
            invited_by: self.invited_by,
            rides_taken: self.rides_taken,
            rides_offered: self.rides_offered,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<MemberWithUserEntity> for MembershipDetail {
    fn from(entity: MemberWithUserEntity) -> Self {
        let membership = entity.membership();
        let user = UserSummary {
            id: entity.user_id,
            username: entity.username,
            first_name: entity.first_name,
            last_name: entity.last_name,
        };
        MembershipDetail::new(membership, user, entity.invited_by_username)
    }
}
