//! Invitation entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the invitations table.
#[derive(Debug, Clone, FromRow)]
pub struct InvitationEntity {
    pub id: Uuid,
    pub code: String,
    pub circle_id: Uuid,
    pub issued_by: Uuid,
    pub used_by: Option<Uuid>,
    pub used: bool,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<InvitationEntity> for domain::models::Invitation {
    fn from(entity: InvitationEntity) -> Self {
        Self {
            id: entity.id,
            code: entity.code,
            circle_id: entity.circle_id,
            issued_by: entity.issued_by,
            used_by: entity.used_by,
            used: entity.used,
            used_at: entity.used_at,
            created_at: entity.created_at,
        }
    }
}
