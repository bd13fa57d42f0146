//! Ride repository for database operations.
//!
//! Every state transition (create, join, finish, rate) runs in a single
//! transaction with the ride row locked, and applies its counter side
//! effects in that same transaction.

use chrono::{DateTime, Utc};
use domain::models::ride::{RideOrdering, UpdateRideRequest};
use domain::services::rides::{self, ALREADY_PASSENGER, ALREADY_RATED, NOT_ACTIVE_MEMBER, RIDE_FULL};
use domain::DomainError;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::membership::{increment_ride_counter, RideCounter};
use crate::entities::{RatingEntity, RideEntity, UserSummaryEntity};
use crate::error::{is_unique_violation, LifecycleError};
use crate::metrics::QueryTimer;

/// Fields for a new ride. Input has already been validated.
#[derive(Debug, Clone)]
pub struct NewRide<'a> {
    pub available_seats: i32,
    pub comments: Option<&'a str>,
    pub departure_location: &'a str,
    pub departure_date: DateTime<Utc>,
    pub arrival_location: &'a str,
    pub arrival_date: DateTime<Utc>,
}

/// Repository for ride-related database operations.
#[derive(Clone)]
pub struct RideRepository {
    pool: PgPool,
}

impl RideRepository {
    /// Creates a new RideRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create a ride offered by `user_id` and bump the rides-offered counters
    /// of the circle, the membership and the profile.
    pub async fn create_ride(
        &self,
        circle_id: Uuid,
        user_id: Uuid,
        membership_id: Uuid,
        ride: &NewRide<'_>,
    ) -> Result<RideEntity, LifecycleError> {
        let timer = QueryTimer::new("create_ride");

        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, RideEntity>(
            r#"
            INSERT INTO rides (offered_by, offered_in, available_seats, comments, departure_location, departure_date, arrival_location, arrival_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, offered_by, offered_in, available_seats, comments, departure_location, departure_date, arrival_location, arrival_date, rating, is_active, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(circle_id)
        .bind(ride.available_seats)
        .bind(ride.comments)
        .bind(ride.departure_location)
        .bind(ride.departure_date)
        .bind(ride.arrival_location)
        .bind(ride.arrival_date)
        .fetch_one(&mut *tx)
        .await?;

        // Membership may have been deactivated since the request was authorized.
        if !increment_ride_counter(&mut tx, membership_id, RideCounter::Offered).await? {
            return Err(DomainError::validation(NOT_ACTIVE_MEMBER).into());
        }

        sqlx::query(
            r#"
            UPDATE circles SET rides_offered = rides_offered + 1, updated_at = NOW() WHERE id = $1
            "#,
        )
        .bind(circle_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE profiles SET rides_offered = rides_offered + 1, updated_at = NOW() WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(created)
    }

    /// Find a ride within a circle.
    pub async fn find_in_circle(
        &self,
        circle_id: Uuid,
        ride_id: Uuid,
    ) -> Result<Option<RideEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_ride_in_circle");
        let result = sqlx::query_as::<_, RideEntity>(
            r#"
            SELECT id, offered_by, offered_in, available_seats, comments, departure_location, departure_date, arrival_location, arrival_date, rating, is_active, created_at, updated_at
            FROM rides
            WHERE id = $1 AND offered_in = $2
            "#,
        )
        .bind(ride_id)
        .bind(circle_id)
        .fetch_optional(&self.pool)
        .await;
        timer.record();
        result
    }

    /// List active rides of a circle.
    ///
    /// `search` matches departure or arrival location, case-insensitive.
    pub async fn list_active(
        &self,
        circle_id: Uuid,
        search: Option<&str>,
        ordering: RideOrdering,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RideEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_active_rides");
        // ORDER BY comes from a fixed set of fragments, never from user text.
        let sql = format!(
            r#"
            SELECT id, offered_by, offered_in, available_seats, comments, departure_location, departure_date, arrival_location, arrival_date, rating, is_active, created_at, updated_at
            FROM rides
            WHERE offered_in = $1
              AND is_active = true
              AND ($2::text IS NULL
                   OR departure_location ILIKE '%' || $2 || '%'
                   OR arrival_location ILIKE '%' || $2 || '%')
            ORDER BY {}, id
            LIMIT $3 OFFSET $4
            "#,
            ordering.as_sql()
        );
        let result = sqlx::query_as::<_, RideEntity>(&sql)
            .bind(circle_id)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await;
        timer.record();
        result
    }

    /// Count active rides of a circle matching `search`.
    pub async fn count_active(
        &self,
        circle_id: Uuid,
        search: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let timer = QueryTimer::new("count_active_rides");
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM rides
            WHERE offered_in = $1
              AND is_active = true
              AND ($2::text IS NULL
                   OR departure_location ILIKE '%' || $2 || '%'
                   OR arrival_location ILIKE '%' || $2 || '%')
            "#,
        )
        .bind(circle_id)
        .bind(search)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Passengers of a ride in join order.
    pub async fn list_passengers(&self, ride_id: Uuid) -> Result<Vec<UserSummaryEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_ride_passengers");
        let result = sqlx::query_as::<_, UserSummaryEntity>(
            r#"
            SELECT u.id, u.username, u.first_name, u.last_name
            FROM ride_passengers p
            JOIN users u ON p.user_id = u.id
            WHERE p.ride_id = $1
            ORDER BY p.joined_at ASC
            "#,
        )
        .bind(ride_id)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Owner update of a ride that has not finished. Seats are left alone.
    pub async fn update_ride(
        &self,
        circle_id: Uuid,
        ride_id: Uuid,
        actor: Uuid,
        changes: &UpdateRideRequest,
    ) -> Result<RideEntity, LifecycleError> {
        let timer = QueryTimer::new("update_ride");

        let mut tx = self.pool.begin().await?;
        let ride = lock_ride(&mut tx, circle_id, ride_id).await?;
        rides::ensure_updatable(actor, &ride.clone().into(), changes)?;

        let updated = sqlx::query_as::<_, RideEntity>(
            r#"
            UPDATE rides
            SET comments = COALESCE($2, comments),
                departure_location = COALESCE($3, departure_location),
                departure_date = COALESCE($4, departure_date),
                arrival_location = COALESCE($5, arrival_location),
                arrival_date = COALESCE($6, arrival_date),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, offered_by, offered_in, available_seats, comments, departure_location, departure_date, arrival_location, arrival_date, rating, is_active, created_at, updated_at
            "#,
        )
        .bind(ride.id)
        .bind(changes.comments.as_deref())
        .bind(changes.departure_location.as_deref())
        .bind(changes.departure_date)
        .bind(changes.arrival_location.as_deref())
        .bind(changes.arrival_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(updated)
    }

    /// Take one seat on a ride.
    ///
    /// Seat decrement and passenger insert happen together; the loser of a
    /// race for the last seat gets a conflict and nothing is written.
    pub async fn join(
        &self,
        circle_id: Uuid,
        ride_id: Uuid,
        user_id: Uuid,
        membership_id: Uuid,
    ) -> Result<RideEntity, LifecycleError> {
        let timer = QueryTimer::new("join_ride");

        let mut tx = self.pool.begin().await?;
        let ride = lock_ride(&mut tx, circle_id, ride_id).await?;

        let already_passenger = is_passenger(&mut tx, ride.id, user_id).await?;
        rides::ensure_joinable(user_id, &ride.clone().into(), already_passenger)?;

        let updated = sqlx::query_as::<_, RideEntity>(
            r#"
            UPDATE rides
            SET available_seats = available_seats - 1, updated_at = NOW()
            WHERE id = $1 AND is_active = true AND available_seats > 0
            RETURNING id, offered_by, offered_in, available_seats, comments, departure_location, departure_date, arrival_location, arrival_date, rating, is_active, created_at, updated_at
            "#,
        )
        .bind(ride.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            tracing::debug!(ride_id = %ride.id, "Last seat taken concurrently");
            DomainError::conflict(RIDE_FULL)
        })?;

        sqlx::query(
            r#"
            INSERT INTO ride_passengers (ride_id, user_id) VALUES ($1, $2)
            "#,
        )
        .bind(ride.id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                LifecycleError::Rejected(DomainError::conflict(ALREADY_PASSENGER))
            } else {
                LifecycleError::Database(e)
            }
        })?;

        if !increment_ride_counter(&mut tx, membership_id, RideCounter::Taken).await? {
            return Err(DomainError::validation(NOT_ACTIVE_MEMBER).into());
        }

        sqlx::query(
            r#"
            UPDATE profiles SET rides_taken = rides_taken + 1, updated_at = NOW() WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE circles SET rides_taken = rides_taken + 1, updated_at = NOW() WHERE id = $1
            "#,
        )
        .bind(circle_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(updated)
    }

    /// Finish a ride. Terminal; a second call fails.
    pub async fn finish(
        &self,
        circle_id: Uuid,
        ride_id: Uuid,
        actor: Uuid,
    ) -> Result<RideEntity, LifecycleError> {
        let timer = QueryTimer::new("finish_ride");

        let mut tx = self.pool.begin().await?;
        let ride = lock_ride(&mut tx, circle_id, ride_id).await?;
        rides::ensure_finishable(actor, &ride.clone().into())?;

        let finished = sqlx::query_as::<_, RideEntity>(
            r#"
            UPDATE rides
            SET is_active = false, updated_at = NOW()
            WHERE id = $1 AND is_active = true
            RETURNING id, offered_by, offered_in, available_seats, comments, departure_location, departure_date, arrival_location, arrival_date, rating, is_active, created_at, updated_at
            "#,
        )
        .bind(ride.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DomainError::conflict(rides::RIDE_FINISHED))?;

        tx.commit().await?;
        timer.record();
        Ok(finished)
    }

    /// Record a passenger's rating of a finished ride, then recompute the
    /// ride average and the offerer's reputation.
    pub async fn rate(
        &self,
        circle_id: Uuid,
        ride_id: Uuid,
        user_id: Uuid,
        rating: f64,
        comments: Option<&str>,
    ) -> Result<(RideEntity, RatingEntity), LifecycleError> {
        let timer = QueryTimer::new("rate_ride");

        let mut tx = self.pool.begin().await?;
        let ride = lock_ride(&mut tx, circle_id, ride_id).await?;

        let was_passenger = is_passenger(&mut tx, ride.id, user_id).await?;
        let already_rated = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM ratings WHERE ride_id = $1 AND rating_user = $2)
            "#,
        )
        .bind(ride.id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;
        rides::ensure_rateable(&ride.clone().into(), was_passenger, already_rated)?;

        let created = sqlx::query_as::<_, RatingEntity>(
            r#"
            INSERT INTO ratings (ride_id, circle_id, rating_user, comments, rating)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, ride_id, circle_id, rating_user, comments, rating, created_at
            "#,
        )
        .bind(ride.id)
        .bind(circle_id)
        .bind(user_id)
        .bind(comments)
        .bind(rating)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                LifecycleError::Rejected(DomainError::conflict(ALREADY_RATED))
            } else {
                LifecycleError::Database(e)
            }
        })?;

        let updated = sqlx::query_as::<_, RideEntity>(
            r#"
            UPDATE rides
            SET rating = (SELECT AVG(rating) FROM ratings WHERE ride_id = $1),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, offered_by, offered_in, available_seats, comments, departure_location, departure_date, arrival_location, arrival_date, rating, is_active, created_at, updated_at
            "#,
        )
        .bind(ride.id)
        .fetch_one(&mut *tx)
        .await?;

        if let Some(offered_by) = updated.offered_by {
            sqlx::query(
                r#"
                UPDATE profiles
                SET reputation = COALESCE(
                        (SELECT AVG(rating) FROM rides WHERE offered_by = $1 AND rating IS NOT NULL),
                        reputation
                    ),
                    updated_at = NOW()
                WHERE user_id = $1
                "#,
            )
            .bind(offered_by)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        timer.record();
        Ok((updated, created))
    }
}

/// Lock a ride of a circle for the rest of the transaction.
async fn lock_ride(
    conn: &mut PgConnection,
    circle_id: Uuid,
    ride_id: Uuid,
) -> Result<RideEntity, LifecycleError> {
    sqlx::query_as::<_, RideEntity>(
        r#"
        SELECT id, offered_by, offered_in, available_seats, comments, departure_location, departure_date, arrival_location, arrival_date, rating, is_active, created_at, updated_at
        FROM rides
        WHERE id = $1 AND offered_in = $2
        FOR UPDATE
        "#,
    )
    .bind(ride_id)
    .bind(circle_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| DomainError::not_found("Ride not found").into())
}

async fn is_passenger(
    conn: &mut PgConnection,
    ride_id: Uuid,
    user_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(SELECT 1 FROM ride_passengers WHERE ride_id = $1 AND user_id = $2)
        "#,
    )
    .bind(ride_id)
    .bind(user_id)
    .fetch_one(conn)
    .await
}
