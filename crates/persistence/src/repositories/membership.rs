//! Membership repository for database operations.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::entities::{MemberWithUserEntity, MembershipEntity};
use crate::metrics::QueryTimer;

/// Which per-membership ride counter to bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideCounter {
    Offered,
    Taken,
}

/// Repository for membership-related database operations.
#[derive(Clone)]
pub struct MembershipRepository {
    pool: PgPool,
}

impl MembershipRepository {
    /// Creates a new MembershipRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Find the membership of a user in a circle, active or not.
    pub async fn find(
        &self,
        user_id: Uuid,
        circle_id: Uuid,
    ) -> Result<Option<MembershipEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_membership");
        let result = sqlx::query_as::<_, MembershipEntity>(
            r#"
            SELECT id, user_id, circle_id, is_admin, is_active, used_invitations, remaining_invitations, invited_by, rides_taken, rides_offered, created_at, updated_at
            FROM memberships
            WHERE user_id = $1 AND circle_id = $2
            "#,
        )
        .bind(user_id)
        .bind(circle_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a member of a circle by username, with user details.
    pub async fn find_by_username(
        &self,
        circle_id: Uuid,
        username: &str,
    ) -> Result<Option<MemberWithUserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_membership_by_username");
        let result = sqlx::query_as::<_, MemberWithUserEntity>(
            r#"
            SELECT
                m.id, m.user_id, m.circle_id, m.is_admin, m.is_active, m.used_invitations,
                m.remaining_invitations, m.invited_by, m.rides_taken, m.rides_offered,
                m.created_at, m.updated_at,
                u.username, u.first_name, u.last_name,
                inviter.username as invited_by_username
            FROM memberships m
            JOIN users u ON m.user_id = u.id
            LEFT JOIN users inviter ON m.invited_by = inviter.id
            WHERE m.circle_id = $1 AND u.username = $2
            "#,
        )
        .bind(circle_id)
        .bind(username)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a membership by ID, with user details.
    pub async fn find_detail(&self, id: Uuid) -> Result<Option<MemberWithUserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_membership_detail");
        let result = sqlx::query_as::<_, MemberWithUserEntity>(
            r#"
            SELECT
                m.id, m.user_id, m.circle_id, m.is_admin, m.is_active, m.used_invitations,
                m.remaining_invitations, m.invited_by, m.rides_taken, m.rides_offered,
                m.created_at, m.updated_at,
                u.username, u.first_name, u.last_name,
                inviter.username as invited_by_username
            FROM memberships m
            JOIN users u ON m.user_id = u.id
            LEFT JOIN users inviter ON m.invited_by = inviter.id
            WHERE m.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List active members of a circle, oldest first.
    pub async fn list_active(
        &self,
        circle_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MemberWithUserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_active_memberships");
        let result = sqlx::query_as::<_, MemberWithUserEntity>(
            r#"
            SELECT
                m.id, m.user_id, m.circle_id, m.is_admin, m.is_active, m.used_invitations,
                m.remaining_invitations, m.invited_by, m.rides_taken, m.rides_offered,
                m.created_at, m.updated_at,
                u.username, u.first_name, u.last_name,
                inviter.username as invited_by_username
            FROM memberships m
            JOIN users u ON m.user_id = u.id
            LEFT JOIN users inviter ON m.invited_by = inviter.id
            WHERE m.circle_id = $1 AND m.is_active = true
            ORDER BY m.created_at ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(circle_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count active members of a circle.
    pub async fn count_active(&self, circle_id: Uuid) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_active_memberships");
        let result = count_active_members(&mut *self.pool.acquire().await?, circle_id).await;
        timer.record();
        result
    }

    /// Soft-deactivate a membership. Deactivating twice is a no-op.
    pub async fn deactivate(&self, id: Uuid) -> Result<MembershipEntity, sqlx::Error> {
        let timer = QueryTimer::new("deactivate_membership");
        let result = sqlx::query_as::<_, MembershipEntity>(
            r#"
            UPDATE memberships
            SET is_active = false,
                updated_at = CASE WHEN is_active THEN NOW() ELSE updated_at END
            WHERE id = $1
            RETURNING id, user_id, circle_id, is_admin, is_active, used_invitations, remaining_invitations, invited_by, rides_taken, rides_offered, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}

/// Active member count on an existing connection or transaction.
pub(crate) async fn count_active_members(
    conn: &mut PgConnection,
    circle_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM memberships WHERE circle_id = $1 AND is_active = true
        "#,
    )
    .bind(circle_id)
    .fetch_one(conn)
    .await
}

/// Bumps a ride counter on an active membership. Returns false when the
/// membership is missing or inactive so the caller can roll back.
pub(crate) async fn increment_ride_counter(
    conn: &mut PgConnection,
    membership_id: Uuid,
    counter: RideCounter,
) -> Result<bool, sqlx::Error> {
    let sql = match counter {
        RideCounter::Offered => {
            r#"
            UPDATE memberships
            SET rides_offered = rides_offered + 1, updated_at = NOW()
            WHERE id = $1 AND is_active = true
            "#
        }
        RideCounter::Taken => {
            r#"
            UPDATE memberships
            SET rides_taken = rides_taken + 1, updated_at = NOW()
            WHERE id = $1 AND is_active = true
            "#
        }
    };
    let result = sqlx::query(sql).bind(membership_id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
