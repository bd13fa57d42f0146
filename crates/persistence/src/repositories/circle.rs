//! Circle repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{CircleEntity, MembershipEntity};
use crate::metrics::QueryTimer;

/// Fields for a new circle. Limits have already been validated.
#[derive(Debug, Clone)]
pub struct NewCircle<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub about: Option<&'a str>,
    pub picture: Option<&'a str>,
    pub is_limited: bool,
    pub members_limit: Option<i32>,
}

/// Client-writable circle fields after merging with the stored row.
#[derive(Debug, Clone)]
pub struct CircleChanges<'a> {
    pub name: Option<&'a str>,
    pub about: Option<&'a str>,
    pub picture: Option<&'a str>,
    pub is_limited: bool,
    pub members_limit: Option<i32>,
}

/// Repository for circle-related database operations.
#[derive(Clone)]
pub struct CircleRepository {
    pool: PgPool,
}

impl CircleRepository {
    /// Creates a new CircleRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create a circle and its founding admin membership.
    pub async fn create_circle(
        &self,
        circle: &NewCircle<'_>,
        created_by: Uuid,
        admin_invitations: i32,
    ) -> Result<(CircleEntity, MembershipEntity), sqlx::Error> {
        let timer = QueryTimer::new("create_circle");

        // Circle and founding membership are created atomically
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, CircleEntity>(
            r#"
            INSERT INTO circles (name, slug, about, picture, is_limited, members_limit)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, slug, about, picture, rides_offered, rides_taken, is_verified, is_public, is_limited, members_limit, created_at, updated_at
            "#,
        )
        .bind(circle.name)
        .bind(circle.slug)
        .bind(circle.about)
        .bind(circle.picture)
        .bind(circle.is_limited)
        .bind(circle.members_limit)
        .fetch_one(&mut *tx)
        .await?;

        let membership = sqlx::query_as::<_, MembershipEntity>(
            r#"
            INSERT INTO memberships (user_id, circle_id, is_admin, is_active, remaining_invitations)
            VALUES ($1, $2, true, true, $3)
            RETURNING id, user_id, circle_id, is_admin, is_active, used_invitations, remaining_invitations, invited_by, rides_taken, rides_offered, created_at, updated_at
            "#,
        )
        .bind(created_by)
        .bind(created.id)
        .bind(admin_invitations)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok((created, membership))
    }

    /// Find a circle by slug. Lookup is not restricted to public circles.
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<CircleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_circle_by_slug");
        let result = sqlx::query_as::<_, CircleEntity>(
            r#"
            SELECT id, name, slug, about, picture, rides_offered, rides_taken, is_verified, is_public, is_limited, members_limit, created_at, updated_at
            FROM circles
            WHERE slug = $1
            "#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List public circles, most active first.
    pub async fn list_public(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CircleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_public_circles");
        let result = sqlx::query_as::<_, CircleEntity>(
            r#"
            SELECT id, name, slug, about, picture, rides_offered, rides_taken, is_verified, is_public, is_limited, members_limit, created_at, updated_at
            FROM circles
            WHERE is_public = true
            ORDER BY rides_taken DESC, rides_offered DESC, created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Count public circles.
    pub async fn count_public(&self) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_public_circles");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM circles WHERE is_public = true
            "#,
        )
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Apply client-writable changes to a circle.
    pub async fn update_circle(
        &self,
        id: Uuid,
        changes: &CircleChanges<'_>,
    ) -> Result<CircleEntity, sqlx::Error> {
        let timer = QueryTimer::new("update_circle");
        let result = sqlx::query_as::<_, CircleEntity>(
            r#"
            UPDATE circles
            SET name = COALESCE($2, name),
                about = COALESCE($3, about),
                picture = COALESCE($4, picture),
                is_limited = $5,
                members_limit = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, slug, about, picture, rides_offered, rides_taken, is_verified, is_public, is_limited, members_limit, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.name)
        .bind(changes.about)
        .bind(changes.picture)
        .bind(changes.is_limited)
        .bind(changes.members_limit)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}

#[cfg(test)]
mod tests {
    // Note: CircleRepository tests require database connection and are covered by integration tests
}
