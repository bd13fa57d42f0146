//! Ride and rating entities (database row mappings).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the rides table.
#[derive(Debug, Clone, FromRow)]
pub struct RideEntity {
    pub id: Uuid,
    pub offered_by: Option<Uuid>,
    pub offered_in: Option<Uuid>,
    pub available_seats: i32,
    pub comments: Option<String>,
    pub departure_location: String,
    pub departure_date: DateTime<Utc>,
    pub arrival_location: String,
    pub arrival_date: DateTime<Utc>,
    pub rating: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RideEntity> for domain::models::Ride {
    fn from(entity: RideEntity) -> Self {
        Self {
            id: entity.id,
            offered_by: entity.offered_by,
            offered_in: entity.offered_in,
            available_seats: entity.available_seats,
            comments: entity.comments,
            departure_location: entity.departure_location,
            departure_date: entity.departure_date,
            arrival_location: entity.arrival_location,
            arrival_date: entity.arrival_date,
            rating: entity.rating,
            is_active: entity.is_active,
            created_at: entity.created_at,
            updated_at: entity.updated_at,
        }
    }
}

/// Database row mapping for the ratings table.
#[derive(Debug, Clone, FromRow)]
pub struct RatingEntity {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub circle_id: Option<Uuid>,
    pub rating_user: Option<Uuid>,
    pub comments: Option<String>,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
}

impl From<RatingEntity> for domain::models::Rating {
    fn from(entity: RatingEntity) -> Self {
        Self {
            id: entity.id,
            ride_id: entity.ride_id,
            circle_id: entity.circle_id,
            rating_user: entity.rating_user,
            comments: entity.comments,
            rating: entity.rating,
            created_at: entity.created_at,
        }
    }
}
