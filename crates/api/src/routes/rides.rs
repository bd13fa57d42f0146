//! Ride routes. Every ride endpoint requires an active membership in the
//! circle; ownership and passenger rules are checked in the repository
//! transaction with the ride row locked.

use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use domain::models::rating::RateRideRequest;
use domain::models::ride::{
    CreateRideRequest, ListRidesQuery, ListRidesResponse, RideResponse, UpdateRideRequest,
};
use domain::models::{Circle, Ride, UserSummary};
use domain::services::rides;
use persistence::entities::RideEntity;
use persistence::repositories::{MembershipRepository, NewRide, RideRepository, UserRepository};
use shared::pagination::{PageParams, Pagination};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::circles::load_circle;
use super::memberships::require_active_member;
use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::{
    record_ride_finished, record_ride_joined, record_ride_offered, record_ride_rated,
};

/// List active rides of a circle.
///
/// GET /api/v1/circles/:slug/rides?search=&ordering=&page=&per_page=
pub async fn list_rides(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(slug): Path<String>,
    Query(query): Query<ListRidesQuery>,
) -> Result<Json<ListRidesResponse>, ApiError> {
    query.validate()?;
    let circle = load_circle(&state, &slug).await?;
    require_active_member(
        &MembershipRepository::new(state.pool.clone()),
        user_auth.user_id,
        &circle,
    )
    .await?;

    let params = PageParams {
        page: query.page,
        per_page: query.per_page,
    };
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let repo = RideRepository::new(state.pool.clone());
    let total = repo.count_active(circle.id, search).await?;
    let entities = repo
        .list_active(
            circle.id,
            search,
            query.ordering,
            params.limit(),
            params.offset(),
        )
        .await?;

    let offerer_ids: Vec<Uuid> = entities.iter().filter_map(|r| r.offered_by).collect();
    let offerers: HashMap<Uuid, UserSummary> = UserRepository::new(state.pool.clone())
        .find_summaries(&offerer_ids)
        .await?
        .into_iter()
        .map(|u| (u.id, u.into()))
        .collect();

    let mut data = Vec::with_capacity(entities.len());
    for entity in entities {
        let passengers = load_passengers(&repo, entity.id).await?;
        let offered_by = entity.offered_by.and_then(|id| offerers.get(&id).cloned());
        data.push(RideResponse::new(
            entity.into(),
            offered_by,
            Some(circle.slug.clone()),
            passengers,
        ));
    }

    Ok(Json(ListRidesResponse {
        data,
        pagination: Pagination::new(&params, total),
    }))
}

/// Offer a ride in a circle.
///
/// POST /api/v1/circles/:slug/rides
pub async fn create_ride(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(slug): Path<String>,
    Json(request): Json<CreateRideRequest>,
) -> Result<(StatusCode, Json<RideResponse>), ApiError> {
    request.validate()?;
    let circle = load_circle(&state, &slug).await?;
    let membership = require_active_member(
        &MembershipRepository::new(state.pool.clone()),
        user_auth.user_id,
        &circle,
    )
    .await?;
    rides::ensure_can_create(user_auth.user_id, request.offered_by, Some(&membership))?;

    let ride = RideRepository::new(state.pool.clone())
        .create_ride(
            circle.id,
            user_auth.user_id,
            membership.id,
            &NewRide {
                available_seats: request.available_seats,
                comments: request.comments.as_deref(),
                departure_location: &request.departure_location,
                departure_date: request.departure_date,
                arrival_location: &request.arrival_location,
                arrival_date: request.arrival_date,
            },
        )
        .await?;

    record_ride_offered();
    info!(
        ride_id = %ride.id,
        circle_id = %circle.id,
        user_id = %user_auth.user_id,
        available_seats = ride.available_seats,
        "Ride offered"
    );

    let response = ride_response(&state, &circle, ride).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Retrieve a ride of a circle.
///
/// GET /api/v1/circles/:slug/rides/:ride_id
pub async fn get_ride(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((slug, ride_id)): Path<(String, Uuid)>,
) -> Result<Json<RideResponse>, ApiError> {
    let circle = load_circle(&state, &slug).await?;
    require_active_member(
        &MembershipRepository::new(state.pool.clone()),
        user_auth.user_id,
        &circle,
    )
    .await?;

    let ride = RideRepository::new(state.pool.clone())
        .find_in_circle(circle.id, ride_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ride not found".to_string()))?;

    Ok(Json(ride_response(&state, &circle, ride).await?))
}

/// Update a ride. Owner only, until the ride is finished.
///
/// PATCH /api/v1/circles/:slug/rides/:ride_id
pub async fn update_ride(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((slug, ride_id)): Path<(String, Uuid)>,
    Json(request): Json<UpdateRideRequest>,
) -> Result<Json<RideResponse>, ApiError> {
    request.validate()?;
    let circle = load_circle(&state, &slug).await?;
    require_active_member(
        &MembershipRepository::new(state.pool.clone()),
        user_auth.user_id,
        &circle,
    )
    .await?;

    let ride = RideRepository::new(state.pool.clone())
        .update_ride(circle.id, ride_id, user_auth.user_id, &request)
        .await?;

    info!(ride_id = %ride.id, user_id = %user_auth.user_id, "Ride updated");

    Ok(Json(ride_response(&state, &circle, ride).await?))
}

/// Take a seat on a ride.
///
/// POST /api/v1/circles/:slug/rides/:ride_id/join
pub async fn join_ride(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((slug, ride_id)): Path<(String, Uuid)>,
) -> Result<Json<RideResponse>, ApiError> {
    let circle = load_circle(&state, &slug).await?;
    let membership = require_active_member(
        &MembershipRepository::new(state.pool.clone()),
        user_auth.user_id,
        &circle,
    )
    .await?;

    let ride = RideRepository::new(state.pool.clone())
        .join(circle.id, ride_id, user_auth.user_id, membership.id)
        .await?;

    record_ride_joined();
    info!(
        ride_id = %ride.id,
        user_id = %user_auth.user_id,
        available_seats = ride.available_seats,
        "Passenger joined ride"
    );

    Ok(Json(ride_response(&state, &circle, ride).await?))
}

/// Finish a ride. Owner only; terminal.
///
/// POST /api/v1/circles/:slug/rides/:ride_id/finish
pub async fn finish_ride(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((slug, ride_id)): Path<(String, Uuid)>,
) -> Result<Json<RideResponse>, ApiError> {
    let circle = load_circle(&state, &slug).await?;
    require_active_member(
        &MembershipRepository::new(state.pool.clone()),
        user_auth.user_id,
        &circle,
    )
    .await?;

    let ride = RideRepository::new(state.pool.clone())
        .finish(circle.id, ride_id, user_auth.user_id)
        .await?;

    record_ride_finished();
    info!(ride_id = %ride.id, user_id = %user_auth.user_id, "Ride finished");

    Ok(Json(ride_response(&state, &circle, ride).await?))
}

/// Rate a finished ride as one of its passengers.
///
/// POST /api/v1/circles/:slug/rides/:ride_id/rate
pub async fn rate_ride(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path((slug, ride_id)): Path<(String, Uuid)>,
    Json(request): Json<RateRideRequest>,
) -> Result<(StatusCode, Json<RideResponse>), ApiError> {
    request.validate()?;
    let circle = load_circle(&state, &slug).await?;
    require_active_member(
        &MembershipRepository::new(state.pool.clone()),
        user_auth.user_id,
        &circle,
    )
    .await?;

    let (ride, rating) = RideRepository::new(state.pool.clone())
        .rate(
            circle.id,
            ride_id,
            user_auth.user_id,
            request.rating,
            request.comments.as_deref(),
        )
        .await?;

    record_ride_rated(rating.rating);
    info!(
        ride_id = %ride.id,
        rating_id = %rating.id,
        user_id = %user_auth.user_id,
        rating = rating.rating,
        average = ?ride.rating,
        "Ride rated"
    );

    let response = ride_response(&state, &circle, ride).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

async fn ride_response(
    state: &AppState,
    circle: &Circle,
    entity: RideEntity,
) -> Result<RideResponse, ApiError> {
    let repo = RideRepository::new(state.pool.clone());
    let passengers = load_passengers(&repo, entity.id).await?;

    let offered_by = match entity.offered_by {
        Some(id) => UserRepository::new(state.pool.clone())
            .find_summaries(&[id])
            .await?
            .into_iter()
            .next()
            .map(Into::into),
        None => None,
    };

    let ride: Ride = entity.into();
    Ok(RideResponse::new(
        ride,
        offered_by,
        Some(circle.slug.clone()),
        passengers,
    ))
}

async fn load_passengers(repo: &RideRepository, ride_id: Uuid) -> Result<Vec<UserSummary>, ApiError> {
    Ok(repo
        .list_passengers(ride_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect())
}
