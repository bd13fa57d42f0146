//! Ride lifecycle rules.
//!
//! OPEN -> FULL happens implicitly when the last seat is taken; both move to
//! FINISHED on `finish`, which is terminal. Every check here is pure; the
//! repository applies the matching writes atomically.

use uuid::Uuid;

use super::policy;
use crate::error::{DomainError, DomainResult};
use crate::models::ride::{check_schedule, Ride, RideState, UpdateRideRequest};
use crate::models::Membership;

pub const RIDE_FULL: &str = "Ride is already full.";
pub const RIDE_FINISHED: &str = "Ride has already finished.";
pub const RIDE_ONGOING: &str = "Ride is still in progress; it can only be rated once finished.";
pub const BEHALF_OF_OTHERS: &str = "Rides offered on behalf of others are not allowed.";
pub const NOT_ACTIVE_MEMBER: &str = "User is not an active member of the circle.";
pub const ALREADY_PASSENGER: &str = "Passenger is already in this ride.";
pub const OWNER_CANNOT_JOIN: &str = "You can't join your own ride.";
pub const NOT_A_PASSENGER: &str = "Only passengers of the ride can rate it.";
pub const ALREADY_RATED: &str = "You have already rated this ride.";

/// Self-offer only, by an active member of the circle.
pub fn ensure_can_create(
    actor: Uuid,
    offered_by: Option<Uuid>,
    membership: Option<&Membership>,
) -> DomainResult<()> {
    if offered_by.is_some_and(|user| user != actor) {
        return Err(DomainError::validation(BEHALF_OF_OTHERS));
    }
    if !membership.is_some_and(|m| m.user_id == actor && m.is_active) {
        return Err(DomainError::validation(NOT_ACTIVE_MEMBER));
    }
    Ok(())
}

/// Rides accept changes until they are finished.
pub fn ensure_mutable(ride: &Ride) -> DomainResult<()> {
    if ride.state() == RideState::Finished {
        return Err(DomainError::validation(RIDE_FINISHED));
    }
    Ok(())
}

/// Owner-only update of a ride that has not finished yet. The schedule is
/// checked against the merged departure and arrival dates.
pub fn ensure_updatable(actor: Uuid, ride: &Ride, req: &UpdateRideRequest) -> DomainResult<()> {
    policy::require_ride_owner(actor, ride)?;
    ensure_mutable(ride)?;

    let departure = req.departure_date.unwrap_or(ride.departure_date);
    let arrival = req.arrival_date.unwrap_or(ride.arrival_date);
    check_schedule(departure, arrival).map_err(|e| {
        DomainError::validation(
            e.message
                .map(|m| m.to_string())
                .unwrap_or_else(|| "Invalid schedule.".to_string()),
        )
    })
}

/// Join preconditions, in order: not the owner, still active, not already a
/// passenger, a seat left.
pub fn ensure_joinable(actor: Uuid, ride: &Ride, already_passenger: bool) -> DomainResult<()> {
    if policy::is_ride_owner(actor, ride) {
        return Err(DomainError::permission(OWNER_CANNOT_JOIN));
    }
    ensure_mutable(ride)?;
    if already_passenger {
        return Err(DomainError::validation(ALREADY_PASSENGER));
    }
    if ride.state() == RideState::Full {
        return Err(DomainError::validation(RIDE_FULL));
    }
    Ok(())
}

/// Owner-only, and only once.
pub fn ensure_finishable(actor: Uuid, ride: &Ride) -> DomainResult<()> {
    policy::require_ride_owner(actor, ride)?;
    ensure_mutable(ride)
}

/// Ratings are accepted from passengers of finished rides, once each.
pub fn ensure_rateable(
    ride: &Ride,
    was_passenger: bool,
    already_rated: bool,
) -> DomainResult<()> {
    if ride.state() != RideState::Finished {
        return Err(DomainError::validation(RIDE_ONGOING));
    }
    if !was_passenger {
        return Err(DomainError::permission(NOT_A_PASSENGER));
    }
    if already_rated {
        return Err(DomainError::validation(ALREADY_RATED));
    }
    Ok(())
}

/// Arithmetic mean, or `None` for no ratings.
pub fn average(ratings: &[f64]) -> Option<f64> {
    if ratings.is_empty() {
        None
    } else {
        Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
    }
}
