//! Ride domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::user::UserSummary;

/// Seats a ride may offer at creation.
pub const MIN_SEATS: i32 = 1;
pub const MAX_SEATS: i32 = 15;

/// A ride offered within a circle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Ride {
    pub id: Uuid,
    /// Null once the offering user is removed.
    pub offered_by: Option<Uuid>,
    /// Null once the hosting circle is removed.
    pub offered_in: Option<Uuid>,
    pub available_seats: i32,
    pub comments: Option<String>,
    pub departure_location: String,
    pub departure_date: DateTime<Utc>,
    pub arrival_location: String,
    pub arrival_date: DateTime<Utc>,
    /// Average of all ratings; null until the first one.
    pub rating: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle state derived from `is_active` and `available_seats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideState {
    Open,
    Full,
    Finished,
}

impl RideState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideState::Open => "open",
            RideState::Full => "full",
            RideState::Finished => "finished",
        }
    }
}

impl fmt::Display for RideState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Ride {
    pub fn state(&self) -> RideState {
        if !self.is_active {
            RideState::Finished
        } else if self.available_seats < 1 {
            RideState::Full
        } else {
            RideState::Open
        }
    }
}

/// Request payload for offering a ride.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
#[validate(schema(function = "validate_ride_schedule"))]
pub struct CreateRideRequest {
    /// Defaults to the requesting user; any other user is rejected.
    pub offered_by: Option<Uuid>,

    #[validate(range(min = 1, max = 15, message = "Available seats must be between 1 and 15"))]
    pub available_seats: i32,

    #[validate(length(max = 2000, message = "Comments must be at most 2000 characters"))]
    pub comments: Option<String>,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Departure location must be between 1 and 255 characters"
    ))]
    pub departure_location: String,

    pub departure_date: DateTime<Utc>,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Arrival location must be between 1 and 255 characters"
    ))]
    pub arrival_location: String,

    pub arrival_date: DateTime<Utc>,
}

fn validate_ride_schedule(req: &CreateRideRequest) -> Result<(), ValidationError> {
    check_schedule(req.departure_date, req.arrival_date)
}

/// Departure must come strictly before arrival.
pub fn check_schedule(
    departure: DateTime<Utc>,
    arrival: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if departure >= arrival {
        let mut err = ValidationError::new("schedule");
        err.message = Some("Departure date must be before arrival date.".into());
        return Err(err);
    }
    Ok(())
}

/// Request payload for updating a ride.
///
/// Seats are not accepted; they only change when a passenger joins.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateRideRequest {
    #[validate(length(max = 2000, message = "Comments must be at most 2000 characters"))]
    pub comments: Option<String>,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Departure location must be between 1 and 255 characters"
    ))]
    pub departure_location: Option<String>,

    pub departure_date: Option<DateTime<Utc>>,

    #[validate(length(
        min = 1,
        max = 255,
        message = "Arrival location must be between 1 and 255 characters"
    ))]
    pub arrival_location: Option<String>,

    pub arrival_date: Option<DateTime<Utc>>,
}

/// Sort order for ride listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RideOrdering {
    #[default]
    DepartureDate,
    ArrivalDate,
    AvailableSeats,
}

impl RideOrdering {
    /// SQL `ORDER BY` fragment; values are fixed, never user text.
    pub fn as_sql(&self) -> &'static str {
        match self {
            RideOrdering::DepartureDate => "departure_date ASC",
            RideOrdering::ArrivalDate => "arrival_date ASC",
            RideOrdering::AvailableSeats => "available_seats DESC",
        }
    }
}

/// Query parameters for listing rides.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct ListRidesQuery {
    /// Matches departure or arrival location, case-insensitive.
    #[validate(length(max = 255, message = "Search must be at most 255 characters"))]
    pub search: Option<String>,

    #[serde(default)]
    pub ordering: RideOrdering,

    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Ride with resolved users, as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RideResponse {
    pub id: Uuid,
    pub offered_by: Option<UserSummary>,
    pub offered_in: Option<String>,
    pub passengers: Vec<UserSummary>,
    pub available_seats: i32,
    pub comments: Option<String>,
    pub departure_location: String,
    pub departure_date: DateTime<Utc>,
    pub arrival_location: String,
    pub arrival_date: DateTime<Utc>,
    pub rating: Option<f64>,
    pub is_active: bool,
    pub state: RideState,
    pub created_at: DateTime<Utc>,
}

impl RideResponse {
    pub fn new(
        ride: Ride,
        offered_by: Option<UserSummary>,
        circle_slug: Option<String>,
        passengers: Vec<UserSummary>,
    ) -> Self {
        let state = ride.state();
        Self {
            id: ride.id,
            offered_by,
            offered_in: circle_slug,
            passengers,
            available_seats: ride.available_seats,
            comments: ride.comments,
            departure_location: ride.departure_location,
            departure_date: ride.departure_date,
            arrival_location: ride.arrival_location,
            arrival_date: ride.arrival_date,
            rating: ride.rating,
            is_active: ride.is_active,
            state,
            created_at: ride.created_at,
        }
    }
}

/// Response for listing rides.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ListRidesResponse {
    pub data: Vec<RideResponse>,
    pub pagination: shared::pagination::Pagination,
}
