//! Membership domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserSummary;

/// Invitation allowance granted to the founding admin of a circle.
pub const FOUNDING_ADMIN_INVITATIONS: i32 = 10;

/// A user's membership in a circle, with its running statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Membership {
    pub id: Uuid,
    pub user_id: Uuid,
    pub circle_id: Uuid,
    pub is_admin: bool,
    pub is_active: bool,
    pub used_invitations: i32,
    pub remaining_invitations: i32,
    /// Null for the founding admin.
    pub invited_by: Option<Uuid>,
    pub rides_taken: i32,
    pub rides_offered: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Membership as shown to other members.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct MembershipDetail {
    pub user: UserSummary,
    pub is_admin: bool,
    pub is_active: bool,
    pub used_invitations: i32,
    pub remaining_invitations: i32,
    pub invited_by: Option<String>,
    pub rides_taken: i32,
    pub rides_offered: i32,
    pub joined_at: DateTime<Utc>,
}

impl MembershipDetail {
    pub fn new(membership: Membership, user: UserSummary, invited_by: Option<String>) -> Self {
        Self {
            user,
            is_admin: membership.is_admin,
            is_active: membership.is_active,
            used_invitations: membership.used_invitations,
            remaining_invitations: membership.remaining_invitations,
            invited_by,
            rides_taken: membership.rides_taken,
            rides_offered: membership.rides_offered,
            joined_at: membership.created_at,
        }
    }
}

/// Response for listing circle members.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListMembersResponse {
    pub data: Vec<MembershipDetail>,
    pub pagination: shared::pagination::Pagination,
}
