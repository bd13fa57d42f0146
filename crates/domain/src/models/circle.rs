//! Circle domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Smallest capacity a limited circle may declare.
pub const MIN_MEMBERS_LIMIT: i32 = 1;

/// Largest capacity a limited circle may declare.
pub const MAX_MEMBERS_LIMIT: i32 = 500;

/// A group that scopes memberships, invitations and rides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Circle {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub about: Option<String>,
    pub picture: Option<String>,
    pub rides_offered: i32,
    pub rides_taken: i32,
    pub is_verified: bool,
    pub is_public: bool,
    pub is_limited: bool,
    pub members_limit: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request payload for creating a circle.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateCircleRequest {
    #[validate(length(min = 1, max = 140, message = "Name must be between 1 and 140 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 40, message = "Slug must be between 1 and 40 characters"))]
    #[validate(custom(function = "shared::validation::validate_slug"))]
    pub slug: String,

    #[validate(length(max = 255, message = "About must be at most 255 characters"))]
    pub about: Option<String>,

    #[validate(url(message = "Picture must be a valid URL"))]
    pub picture: Option<String>,

    #[serde(default)]
    pub is_limited: bool,

    #[validate(range(min = 1, max = 500, message = "Members limit must be between 1 and 500"))]
    pub members_limit: Option<i32>,
}

/// Request payload for updating a circle.
///
/// `is_public`, `is_verified` and the ride statistics are not accepted.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateCircleRequest {
    #[validate(length(min = 1, max = 140, message = "Name must be between 1 and 140 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 255, message = "About must be at most 255 characters"))]
    pub about: Option<String>,

    #[validate(url(message = "Picture must be a valid URL"))]
    pub picture: Option<String>,

    pub is_limited: Option<bool>,

    #[validate(range(min = 1, max = 500, message = "Members limit must be between 1 and 500"))]
    pub members_limit: Option<i32>,
}
