//! Circle entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the circles table.
#[derive(Debug, Clone, FromRow)]
pub struct CircleEntity {
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

impl From<CircleEntity> for domain::models::Circle {
    fn from(entity: CircleEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            slug: entity.slug,
            about: entity.about,
            picture: entity.picture,
            rides_offered: entity.rides_offered,
            rides_taken: entity.rides_taken,
            is_verified: entity.is_verified,
            is_public: entity.is_public,
            is_limited: entity.is_limited,
            members_limit: entity.members_limit,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}
