//! User account and profile domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::circle::Circle;

/// Starting reputation for every new profile.
pub const DEFAULT_REPUTATION: f64 = 5.0;

/// Represents a user account in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: String,
    #[serde(skip_serializing)] // Never serialize password hash to API responses
    pub password_hash: String,
    pub is_client: bool,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public statistics and biography attached to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Profile {
    pub user_id: Uuid,
    pub picture: Option<String>,
    pub biography: Option<String>,
    pub rides_taken: i32,
    pub rides_offered: i32,
    pub reputation: f64,
}

/// Compact user reference embedded in other responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        }
    }
}

/// Request payload for account signup.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
#[validate(schema(function = "validate_password_confirmation", skip_on_field_errors = false))]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 4, max = 20, message = "Username must be 4-20 characters"))]
    #[validate(custom(function = "shared::validation::validate_username"))]
    pub username: String,

    #[validate(custom(function = "shared::validation::validate_phone_number"))]
    pub phone_number: String,

    #[validate(length(min = 8, max = 64, message = "Password must be 8-64 characters"))]
    pub password: String,

    #[validate(length(min = 8, max = 64, message = "Password must be 8-64 characters"))]
    pub password_confirmation: String,

    #[validate(length(min = 2, max = 30, message = "First name must be 2-30 characters"))]
    pub first_name: String,

    #[validate(length(min = 2, max = 30, message = "Last name must be 2-30 characters"))]
    pub last_name: String,
}

fn validate_password_confirmation(req: &SignupRequest) -> Result<(), ValidationError> {
    if req.password != req.password_confirmation {
        let mut err = ValidationError::new("password_mismatch");
        err.message = Some("Passwords don't match.".into());
        return Err(err);
    }
    Ok(())
}

/// Request payload for login.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, max = 64, message = "Password must be 8-64 characters"))]
    pub password: String,
}

/// Request payload for account verification.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct VerifyAccountRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
}

/// Request payload for profile updates. Counters and reputation are read-only.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateProfileRequest {
    #[validate(length(max = 250, message = "Biography must be at most 250 characters"))]
    pub biography: Option<String>,

    #[validate(url(message = "Picture must be a valid URL"))]
    pub picture: Option<String>,
}

/// User with its profile, as returned by signup and retrieval.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub profile: Profile,
}

impl UserResponse {
    pub fn new(user: User, profile: Profile) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone_number: user.phone_number,
            profile,
        }
    }
}

/// User detail including the circles the user is an active member of.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct UserDetailResponse {
    pub user: UserResponse,
    pub circles: Vec<Circle>,
}

/// Response after successful login.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}
