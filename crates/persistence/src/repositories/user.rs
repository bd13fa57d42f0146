//! User repository for database operations.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{CircleEntity, ProfileEntity, UserEntity, UserSummaryEntity};
use crate::metrics::QueryTimer;

/// New account fields; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub email: &'a str,
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub phone_number: &'a str,
    pub password_hash: &'a str,
}

/// Repository for user and profile database operations.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create an unverified client user together with an empty profile.
    pub async fn create_user(
        &self,
        new_user: &NewUser<'_>,
    ) -> Result<(UserEntity, ProfileEntity), sqlx::Error> {
        let timer = QueryTimer::new("create_user");

        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, UserEntity>(
            r#"
            INSERT INTO users (email, username, first_name, last_name, phone_number, password_hash, is_client, is_verified)
            VALUES ($1, $2, $3, $4, $5, $6, true, false)
            RETURNING id, email, username, first_name, last_name, phone_number, password_hash, is_client, is_verified, created_at, updated_at
            "#,
        )
        .bind(new_user.email)
        .bind(new_user.username)
        .bind(new_user.first_name)
        .bind(new_user.last_name)
        .bind(new_user.phone_number)
        .bind(new_user.password_hash)
        .fetch_one(&mut *tx)
        .await?;

        let profile = sqlx::query_as::<_, ProfileEntity>(
            r#"
            INSERT INTO profiles (user_id)
            VALUES ($1)
            RETURNING user_id, picture, biography, rides_taken, rides_offered, reputation
            "#,
        )
        .bind(user.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok((user, profile))
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_id");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, username, first_name, last_name, phone_number, password_hash, is_client, is_verified, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_email");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, username, first_name, last_name, phone_number, password_hash, is_client, is_verified, created_at, updated_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Find a client user by username.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_by_username");
        let result = sqlx::query_as::<_, UserEntity>(
            r#"
            SELECT id, email, username, first_name, last_name, phone_number, password_hash, is_client, is_verified, created_at, updated_at
            FROM users
            WHERE username = $1 AND is_client = true
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Mark an account as verified. Returns false if the user does not exist.
    pub async fn mark_verified(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("mark_user_verified");
        let result = sqlx::query(
            r#"
            UPDATE users
            SET is_verified = true, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await;
        timer.record();
        Ok(result?.rows_affected() > 0)
    }

    /// Find a user's profile.
    pub async fn find_profile(&self, user_id: Uuid) -> Result<Option<ProfileEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_profile");
        let result = sqlx::query_as::<_, ProfileEntity>(
            r#"
            SELECT user_id, picture, biography, rides_taken, rides_offered, reputation
            FROM profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Update the writable profile fields. `None` keeps the stored value.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        biography: Option<&str>,
        picture: Option<&str>,
    ) -> Result<ProfileEntity, sqlx::Error> {
        let timer = QueryTimer::new("update_profile");
        let result = sqlx::query_as::<_, ProfileEntity>(
            r#"
            UPDATE profiles
            SET biography = COALESCE($2, biography),
                picture = COALESCE($3, picture),
                updated_at = NOW()
            WHERE user_id = $1
            RETURNING user_id, picture, biography, rides_taken, rides_offered, reputation
            "#,
        )
        .bind(user_id)
        .bind(biography)
        .bind(picture)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Circles the user is an active member of.
    pub async fn find_active_circles(&self, user_id: Uuid) -> Result<Vec<CircleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_active_circles");
        let result = sqlx::query_as::<_, CircleEntity>(
            r#"
            SELECT c.id, c.name, c.slug, c.about, c.picture, c.rides_offered, c.rides_taken,
                   c.is_verified, c.is_public, c.is_limited, c.members_limit, c.created_at, c.updated_at
            FROM circles c
            JOIN memberships m ON m.circle_id = c.id
            WHERE m.user_id = $1 AND m.is_active = true
            ORDER BY c.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Compact user rows for a set of IDs.
    pub async fn find_summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_summaries");
        let result = sqlx::query_as::<_, UserSummaryEntity>(
            r#"
            SELECT id, username, first_name, last_name
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
