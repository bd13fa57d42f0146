//! Circle membership routes: member listing, invitation redemption,
//! leaving a circle and invitation codes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::invitation::{InvitationsResponse, RedeemInvitationRequest};
use domain::models::membership::{ListMembersResponse, MembershipDetail};
use domain::models::{Circle, Membership};
use domain::services::policy;
use persistence::entities::MemberWithUserEntity;
use persistence::repositories::{InvitationRepository, MembershipRepository};
use shared::pagination::{PageParams, Pagination};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::circles::load_circle;
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::{record_invitation_redeemed, record_invitations_issued};

/// List active members of a circle.
///
/// GET /api/v1/circles/:slug/members
///
/// Caller must be an active member.
pub async fn list_members(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(slug): Path<String>,
    Query(params): Query<PageParams>,
) -> Result<Json<ListMembersResponse>, ApiError> {
    let circle = load_circle(&state, &slug).await?;
    let repo = MembershipRepository::new(state.pool.clone());
    require_active_member(&repo, user_auth.user_id, &circle).await?;

    let total = repo.count_active(circle.id).await?;
    let members: Vec<MembershipDetail> = repo
        .list_active(circle.id, params.limit(), params.offset())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(ListMembersResponse {
        data: members,
        pagination: Pagination::new(&params, total),
    }))
}

/// Join a circle with an invitation code.
///
/// POST /api/v1/circles/:slug/members
pub async fn redeem_invitation(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(slug): Path<String>,
    Json(request): Json<RedeemInvitationRequest>,
) -> Result<(StatusCode, Json<MembershipDetail>), ApiError> {
    request.validate()?;
    let circle = load_circle(&state, &slug).await?;

    let membership = InvitationRepository::new(state.pool.clone())
        .redeem(
            circle.id,
            &request.invitation_code,
            user_auth.user_id,
            state.config.limits.member_invitations,
        )
        .await?;

    record_invitation_redeemed();
    info!(
        circle_id = %circle.id,
        user_id = %user_auth.user_id,
        membership_id = %membership.id,
        invited_by = ?membership.invited_by,
        "Invitation redeemed"
    );

    let detail = MembershipRepository::new(state.pool.clone())
        .find_detail(membership.id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("Membership {} vanished", membership.id)))?;

    Ok((StatusCode::CREATED, Json(detail.into())))
}

/// Retrieve an active member of a circle by username.
///
/// GET /api/v1/circles/:slug/members/:username
pub async fn get_member(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((slug, username)): Path<(String, String)>,
) -> Result<Json<MembershipDetail>, ApiError> {
    let circle = load_circle(&state, &slug).await?;
    let repo = MembershipRepository::new(state.pool.clone());
    require_active_member(&repo, user_auth.user_id, &circle).await?;

    let member = find_member(&repo, &circle, &username)
        .await?
        .filter(|m| m.is_active)
        .ok_or_else(member_not_found)?;

    Ok(Json(member.into()))
}

/// Leave a circle. Members can only deactivate their own membership.
///
/// DELETE /api/v1/circles/:slug/members/:username
pub async fn remove_member(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((slug, username)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let circle = load_circle(&state, &slug).await?;
    let repo = MembershipRepository::new(state.pool.clone());

    let member = find_member(&repo, &circle, &username)
        .await?
        .ok_or_else(member_not_found)?;
    policy::require_self(user_auth.user_id, &member.membership())?;

    let membership = repo.deactivate(member.id).await?;

    info!(
        circle_id = %circle.id,
        user_id = %user_auth.user_id,
        membership_id = %membership.id,
        "Membership deactivated"
    );

    Ok(StatusCode::NO_CONTENT)
}

/// A member's unused invitation codes, topped up to their remaining
/// allowance.
///
/// GET /api/v1/circles/:slug/members/:username/invitations
pub async fn list_invitations(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((slug, username)): Path<(String, String)>,
) -> Result<Json<InvitationsResponse>, ApiError> {
    let circle = load_circle(&state, &slug).await?;
    let repo = MembershipRepository::new(state.pool.clone());

    let member = find_member(&repo, &circle, &username)
        .await?
        .ok_or_else(member_not_found)?;
    let membership = member.membership();
    policy::require_self(user_auth.user_id, &membership)?;
    policy::require_active_member(user_auth.user_id, circle.id, Some(&membership))?;

    let held = InvitationRepository::new(state.pool.clone())
        .top_up_unused(circle.id, user_auth.user_id)
        .await?
        .ok_or_else(member_not_found)?;

    if held.issued > 0 {
        record_invitations_issued(held.issued);
        info!(
            circle_id = %circle.id,
            user_id = %user_auth.user_id,
            issued = held.issued,
            "Invitations issued"
        );
    }

    Ok(Json(InvitationsResponse {
        used_invitations: held.membership.used_invitations,
        remaining_invitations: held.membership.remaining_invitations,
        invitations: held.codes,
    }))
}

/// The caller's active membership in `circle`, or 403.
pub(crate) async fn require_active_member(
    repo: &MembershipRepository,
    user_id: Uuid,
    circle: &Circle,
) -> Result<Membership, ApiError> {
    let membership: Option<Membership> = repo.find(user_id, circle.id).await?.map(Into::into);
    policy::require_active_member(user_id, circle.id, membership.as_ref())?;
    membership.ok_or_else(|| ApiError::Forbidden("Not a member of this circle".to_string()))
}

async fn find_member(
    repo: &MembershipRepository,
    circle: &Circle,
    username: &str,
) -> Result<Option<MemberWithUserEntity>, ApiError> {
    Ok(repo.find_by_username(circle.id, username).await?)
}

fn member_not_found() -> ApiError {
    ApiError::NotFound("Membership not found".to_string())
}
