//! Invitation repository for database operations.
//!
//! Redemption runs as one transaction: the invitation row is locked, the
//! circle row is locked for the capacity check, and the `used` flag is only
//! flipped while it is still false. Topping up a member's codes holds the
//! membership row lock, so concurrent listings issue each code once.

use domain::models::invitation::generate_invitation_code;
use domain::services::invitations::{self, ALREADY_MEMBER, INVALID_CODE};
use domain::DomainError;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::membership::count_active_members;
use crate::entities::{CircleEntity, InvitationEntity, MembershipEntity};
use crate::error::{is_unique_violation, LifecycleError};
use crate::metrics::QueryTimer;

/// Attempts before giving up on finding an unused code.
const MAX_CODE_ATTEMPTS: u32 = 100;

/// A member's unused codes after a top-up.
#[derive(Debug, Clone)]
pub struct HeldInvitations {
    /// Membership as read under the row lock.
    pub membership: MembershipEntity,
    /// Unused codes, oldest first.
    pub codes: Vec<String>,
    /// How many of `codes` were issued by this call.
    pub issued: usize,
}

/// Repository for invitation-related database operations.
#[derive(Clone)]
pub struct InvitationRepository {
    pool: PgPool,
}

impl InvitationRepository {
    /// Creates a new InvitationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Issue an invitation for a circle. The issuer's balance is not checked.
    ///
    /// A supplied `code` that is already taken in the circle is replaced with
    /// a freshly generated one.
    pub async fn create_invitation(
        &self,
        circle_id: Uuid,
        issued_by: Uuid,
        code: Option<String>,
    ) -> Result<InvitationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_invitation");
        let mut conn = self.pool.acquire().await?;
        let result =
            insert_with_unique_code(&mut conn, circle_id, issued_by, code, generate_invitation_code)
                .await;
        timer.record();
        result
    }

    /// Issue codes until the member holds one unused code per remaining
    /// invitation. Returns `None` if the user has no membership in the circle.
    pub async fn top_up_unused(
        &self,
        circle_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<HeldInvitations>, sqlx::Error> {
        let timer = QueryTimer::new("top_up_invitations");

        let mut tx = self.pool.begin().await?;
        let membership = sqlx::query_as::<_, MembershipEntity>(
            r#"
            SELECT id, user_id, circle_id, is_admin, is_active, used_invitations, remaining_invitations, invited_by, rides_taken, rides_offered, created_at, updated_at
            FROM memberships
            WHERE user_id = $1 AND circle_id = $2
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(circle_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(membership) = membership else {
            return Ok(None);
        };

        let mut codes: Vec<String> = list_unused(&mut tx, circle_id, user_id)
            .await?
            .into_iter()
            .map(|inv| inv.code)
            .collect();

        let issued = invitations::codes_to_issue(membership.remaining_invitations, codes.len());
        for _ in 0..issued {
            let invitation =
                insert_with_unique_code(&mut tx, circle_id, user_id, None, generate_invitation_code)
                    .await?;
            codes.push(invitation.code);
        }

        tx.commit().await?;
        timer.record();
        Ok(Some(HeldInvitations {
            membership,
            codes,
            issued,
        }))
    }

    /// Redeem `code` for `user_id` in `circle_id`.
    ///
    /// Creates the new membership, consumes the invitation and updates the
    /// issuer's counters, or writes nothing.
    pub async fn redeem(
        &self,
        circle_id: Uuid,
        code: &str,
        user_id: Uuid,
        member_invitations: i32,
    ) -> Result<MembershipEntity, LifecycleError> {
        let timer = QueryTimer::new("redeem_invitation");

        // Dropping the transaction on an early return rolls it back.
        let mut tx = self.pool.begin().await?;
        let membership =
            redeem_in_tx(&mut tx, circle_id, code, user_id, member_invitations).await?;
        tx.commit().await?;
        timer.record();
        Ok(membership)
    }
}

async fn redeem_in_tx(
    conn: &mut PgConnection,
    circle_id: Uuid,
    code: &str,
    user_id: Uuid,
    member_invitations: i32,
) -> Result<MembershipEntity, LifecycleError> {
    // The circle row lock serializes capacity checks of concurrent redemptions.
    let circle = sqlx::query_as::<_, CircleEntity>(
        r#"
        SELECT id, name, slug, about, picture, rides_offered, rides_taken, is_verified, is_public, is_limited, members_limit, created_at, updated_at
        FROM circles
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(circle_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DomainError::not_found("Circle not found"))?;

    let existing = sqlx::query_as::<_, MembershipEntity>(
        r#"
        SELECT id, user_id, circle_id, is_admin, is_active, used_invitations, remaining_invitations, invited_by, rides_taken, rides_offered, created_at, updated_at
        FROM memberships
        WHERE user_id = $1 AND circle_id = $2
        "#,
    )
    .bind(user_id)
    .bind(circle_id)
    .fetch_optional(&mut *conn)
    .await?;

    let invitation = sqlx::query_as::<_, InvitationEntity>(
        r#"
        SELECT id, code, circle_id, issued_by, used_by, used, used_at, created_at
        FROM invitations
        WHERE circle_id = $1 AND code = $2 AND used = false
        FOR UPDATE
        "#,
    )
    .bind(circle_id)
    .bind(code)
    .fetch_optional(&mut *conn)
    .await?;

    let active_members = count_active_members(&mut *conn, circle_id).await?;

    let circle: domain::models::Circle = circle.into();
    let existing: Option<domain::models::Membership> = existing.map(Into::into);
    let invitation: Option<domain::models::Invitation> = invitation.map(Into::into);
    let invitation = invitations::check_redemption(
        existing.as_ref(),
        invitation.as_ref(),
        &circle,
        active_members,
    )?;

    let consumed = sqlx::query(
        r#"
        UPDATE invitations
        SET used = true, used_by = $2, used_at = NOW()
        WHERE id = $1 AND used = false
        "#,
    )
    .bind(invitation.id)
    .bind(user_id)
    .execute(&mut *conn)
    .await?;
    if consumed.rows_affected() == 0 {
        tracing::debug!(invitation_id = %invitation.id, "Invitation redeemed concurrently");
        return Err(DomainError::conflict(INVALID_CODE).into());
    }

    let membership = sqlx::query_as::<_, MembershipEntity>(
        r#"
        INSERT INTO memberships (user_id, circle_id, is_admin, is_active, invited_by, remaining_invitations)
        VALUES ($1, $2, false, true, $3, $4)
        RETURNING id, user_id, circle_id, is_admin, is_active, used_invitations, remaining_invitations, invited_by, rides_taken, rides_offered, created_at, updated_at
        "#,
    )
    .bind(user_id)
    .bind(circle_id)
    .bind(invitation.issued_by)
    .bind(member_invitations)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            LifecycleError::Rejected(DomainError::conflict(ALREADY_MEMBER))
        } else {
            LifecycleError::Database(e)
        }
    })?;

    // Balance is floored at zero.
    sqlx::query(
        r#"
        UPDATE memberships
        SET used_invitations = used_invitations + 1,
            remaining_invitations = GREATEST(remaining_invitations - 1, 0),
            updated_at = NOW()
        WHERE user_id = $1 AND circle_id = $2
        "#,
    )
    .bind(invitation.issued_by)
    .bind(circle_id)
    .execute(&mut *conn)
    .await?;

    Ok(membership)
}

/// Inserts an invitation under `candidate`, or under a generated code when
/// the candidate is absent or already taken in the circle.
///
/// `ON CONFLICT DO NOTHING` covers a concurrent insert of the same code
/// without aborting the surrounding transaction.
async fn insert_with_unique_code<F>(
    conn: &mut PgConnection,
    circle_id: Uuid,
    issued_by: Uuid,
    candidate: Option<String>,
    generator: F,
) -> Result<InvitationEntity, sqlx::Error>
where
    F: Fn() -> String,
{
    let mut candidate = candidate;
    for _ in 0..MAX_CODE_ATTEMPTS {
        let code = candidate.take().unwrap_or_else(&generator);

        let taken = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM invitations WHERE circle_id = $1 AND code = $2)
            "#,
        )
        .bind(circle_id)
        .bind(&code)
        .fetch_one(&mut *conn)
        .await?;
        if taken {
            continue;
        }

        let inserted = sqlx::query_as::<_, InvitationEntity>(
            r#"
            INSERT INTO invitations (code, circle_id, issued_by)
            VALUES ($1, $2, $3)
            ON CONFLICT (circle_id, code) DO NOTHING
            RETURNING id, code, circle_id, issued_by, used_by, used, used_at, created_at
            "#,
        )
        .bind(&code)
        .bind(circle_id)
        .bind(issued_by)
        .fetch_optional(&mut *conn)
        .await?;
        if let Some(invitation) = inserted {
            return Ok(invitation);
        }
        tracing::debug!(%circle_id, "Invitation code taken concurrently, regenerating");
    }

    Err(sqlx::Error::Protocol(
        "Could not generate unique invitation code".to_string(),
    ))
}

/// Unused invitations issued by a member in a circle, oldest first.
async fn list_unused(
    conn: &mut PgConnection,
    circle_id: Uuid,
    issued_by: Uuid,
) -> Result<Vec<InvitationEntity>, sqlx::Error> {
    sqlx::query_as::<_, InvitationEntity>(
        r#"
        SELECT id, code, circle_id, issued_by, used_by, used, used_at, created_at
        FROM invitations
        WHERE circle_id = $1 AND issued_by = $2 AND used = false
        ORDER BY created_at ASC, id
        "#,
    )
    .bind(circle_id)
    .bind(issued_by)
    .fetch_all(conn)
    .await
}
