//! Circle routes: public listing, creation, retrieval and admin updates.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::circle::{CreateCircleRequest, UpdateCircleRequest};
use domain::models::Circle;
use domain::services::{circles, policy};
use persistence::error::is_unique_violation;
use persistence::repositories::{CircleChanges, CircleRepository, MembershipRepository, NewCircle};
use shared::pagination::{Page, PageParams};
use tracing::info;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_circle_created;

/// List public circles.
///
/// GET /api/v1/circles
pub async fn list_circles(
    State(state): State<AppState>,
    _user_auth: UserAuth,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<Circle>>, ApiError> {
    let repo = CircleRepository::new(state.pool.clone());

    let total = repo.count_public().await?;
    let circles: Vec<Circle> = repo
        .list_public(params.limit(), params.offset())
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(Page::new(circles, &params, total)))
}

/// Create a circle. The creator becomes its founding admin.
///
/// POST /api/v1/circles
pub async fn create_circle(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Json(request): Json<CreateCircleRequest>,
) -> Result<(StatusCode, Json<Circle>), ApiError> {
    request.validate()?;
    circles::validate_create(&request)?;

    let repo = CircleRepository::new(state.pool.clone());
    let (circle, membership) = repo
        .create_circle(
            &NewCircle {
                name: &request.name,
                slug: &request.slug,
                about: request.about.as_deref(),
                picture: request.picture.as_deref(),
                is_limited: request.is_limited,
                members_limit: request.members_limit,
            },
            user_auth.user_id,
            state.config.limits.admin_invitations,
        )
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict("A circle with this slug already exists.".to_string())
            } else {
                e.into()
            }
        })?;

    record_circle_created();
    info!(
        circle_id = %circle.id,
        slug = %circle.slug,
        user_id = %user_auth.user_id,
        membership_id = %membership.id,
        "Circle created"
    );

    Ok((StatusCode::CREATED, Json(circle.into())))
}

/// Retrieve a circle by slug.
///
/// GET /api/v1/circles/:slug
pub async fn get_circle(
    State(state): State<AppState>,
    _user_auth: UserAuth,
    Path(slug): Path<String>,
) -> Result<Json<Circle>, ApiError> {
    let circle = load_circle(&state, &slug).await?;
    Ok(Json(circle))
}

/// Update a circle. Active admins only.
///
/// PUT/PATCH /api/v1/circles/:slug
pub async fn update_circle(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(slug): Path<String>,
    Json(request): Json<UpdateCircleRequest>,
) -> Result<Json<Circle>, ApiError> {
    let circle = load_circle(&state, &slug).await?;

    let membership = MembershipRepository::new(state.pool.clone())
        .find(user_auth.user_id, circle.id)
        .await?
        .map(domain::models::Membership::from);
    policy::require_circle_admin(user_auth.user_id, circle.id, membership.as_ref())?;

    request.validate()?;
    let (is_limited, members_limit) = circles::validate_update(&circle, &request)?;

    let updated = CircleRepository::new(state.pool.clone())
        .update_circle(
            circle.id,
            &CircleChanges {
                name: request.name.as_deref(),
                about: request.about.as_deref(),
                picture: request.picture.as_deref(),
                is_limited,
                members_limit,
            },
        )
        .await?;

    info!(
        circle_id = %circle.id,
        user_id = %user_auth.user_id,
        is_limited,
        members_limit = ?members_limit,
        "Circle updated"
    );

    Ok(Json(updated.into()))
}

/// Load a circle by slug or fail with 404.
pub(crate) async fn load_circle(state: &AppState, slug: &str) -> Result<Circle, ApiError> {
    CircleRepository::new(state.pool.clone())
        .find_by_slug(slug)
        .await?
        .map(Into::into)
        .ok_or_else(|| ApiError::NotFound("Circle not found".to_string()))
}
