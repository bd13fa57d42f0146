//! User and profile entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    pub password_hash: String,
    pub is_client: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserEntity> for domain::models::User {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            email: entity.email,
            username: entity.username,
            first_name: entity.first_name,
            last_name: entity.last_name,
            phone_number: entity.phone_number,
            password_hash: entity.password_hash,
            is_client: entity.is_client,
            is_verified: entity.is_verified,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the profiles table.
#[derive(Debug, Clone, FromRow)]
pub struct ProfileEntity {
    pub user_id: Uuid,
    pub picture: Option<String>,
    pub biography: Option<String>,
    pub rides_taken: i32,
    pub rides_offered: i32,
    pub reputation: f64,
}

impl From<ProfileEntity> for domain::models::Profile {
    fn from(entity: ProfileEntity) -> Self {
        Self {
            user_id: entity.user_id,
            picture: entity.picture,
            biography: entity.biography,
            rides_taken: entity.rides_taken,
            rides_offered: entity.rides_offered,
            reputation: entity.reputation,
        }
    }
}

/// Compact user columns used when embedding users in other responses.
#[derive(Debug, Clone, FromRow)]
pub struct UserSummaryEntity {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<UserSummaryEntity> for domain::models::UserSummary {
    fn from(entity: UserSummaryEntity) -> Self {
        Self {
            id: entity.id,
            username: entity.username,
            first_name: entity.first_name,
            last_name: entity.last_name,
        }
    }
}
