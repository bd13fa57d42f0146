//! Ride rating domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Feedback left by a passenger on a finished ride.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Rating {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub circle_id: Option<Uuid>,
    /// Null once the author's account is removed.
    pub rating_user: Option<Uuid>,
    pub comments: Option<String>,
    pub rating: f64,
    pub created_at: DateTime<Utc>,
}

/// Request payload for rating a ride.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct RateRideRequest {
    #[validate(custom(function = "shared::validation::validate_rating_value"))]
    pub rating: f64,

    #[validate(length(max = 2000, message = "Comments must be at most 2000 characters"))]
    pub comments: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_request_range() {
        let ok = RateRideRequest {
            rating: 4.0,
            comments: Some("Smooth ride".to_string()),
        };
        assert!(ok.validate().is_ok());

        let too_high = RateRideRequest {
            rating: 6.0,
            comments: None,
        };
        assert!(too_high.validate().is_err());

        let too_low = RateRideRequest {
            rating: 0.0,
            comments: None,
        };
        assert!(too_low.validate().is_err());
    }
}
