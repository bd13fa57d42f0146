//! Account routes: signup, login, verification and profiles.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use domain::models::user::{
    LoginRequest, LoginResponse, SignupRequest, UpdateProfileRequest, UserDetailResponse,
    UserResponse, VerifyAccountRequest,
};
use domain::models::{Circle, Profile, User};
use domain::services::Job;
use persistence::repositories::{NewUser, UserRepository};
use serde::Serialize;
use shared::jwt::{extract_user_id, JwtError};
use shared::password::{check_password_strength, hash_password, verify_password};
use tracing::{info, warn};
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::UserAuth;
use crate::middleware::metrics::record_signup;

const INVALID_CREDENTIALS: &str = "Invalid credentials";
const NOT_VERIFIED: &str = "Account hasn't been activated.";
const VERIFICATION_EXPIRED: &str = "Verification link has expired.";
const INVALID_TOKEN: &str = "Invalid token";

/// Plain acknowledgement body.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Sign up a new, unverified client account.
///
/// POST /api/v1/users/signup
///
/// Queues the verification email; a queue failure does not fail signup.
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    request.validate()?;
    check_password_strength(&request.password).map_err(ApiError::Validation)?;

    let repo = UserRepository::new(state.pool.clone());

    if repo.find_by_email(&request.email).await?.is_some() {
        return Err(ApiError::Conflict(
            "A user with that email already exists.".to_string(),
        ));
    }
    if repo.find_by_username(&request.username).await?.is_some() {
        return Err(ApiError::Conflict(
            "A user with that username already exists.".to_string(),
        ));
    }

    let password_hash = hash_password(&request.password)
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))?;

    let email = request.email.to_lowercase();
    let (user, profile) = repo
        .create_user(&NewUser {
            email: &email,
            username: &request.username,
            first_name: &request.first_name,
            last_name: &request.last_name,
            phone_number: &request.phone_number,
            password_hash: &password_hash,
        })
        .await?;

    if let Err(e) = state
        .jobs
        .submit(Job::SendConfirmationEmail { user_id: user.id })
        .await
    {
        warn!(user_id = %user.id, error = %e, "Failed to queue verification email");
    }

    record_signup();
    info!(user_id = %user.id, username = %user.username, "User signed up");

    Ok((
        StatusCode::CREATED,
        Json(UserResponse::new(user.into(), profile.into())),
    ))
}

/// Exchange credentials for an access token.
///
/// POST /api/v1/users/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    request.validate()?;

    let repo = UserRepository::new(state.pool.clone());

    let user: User = repo
        .find_by_email(&request.email)
        .await?
        .ok_or_else(|| ApiError::Validation(INVALID_CREDENTIALS.to_string()))?
        .into();

    let password_ok = verify_password(&request.password, &user.password_hash)
        .map_err(|e| ApiError::Internal(format!("Failed to verify password: {}", e)))?;
    if !password_ok {
        info!(user_id = %user.id, "Login rejected: wrong password");
        return Err(ApiError::Validation(INVALID_CREDENTIALS.to_string()));
    }

    if !user.is_verified {
        return Err(ApiError::Validation(NOT_VERIFIED.to_string()));
    }

    let (access_token, jti) = state
        .jwt
        .generate_access_token(user.id)
        .map_err(|e| ApiError::Internal(format!("Failed to issue token: {}", e)))?;

    let profile = load_profile(&repo, &user).await?;

    info!(user_id = %user.id, jti = %jti, "User logged in");

    Ok(Json(LoginResponse {
        user: UserResponse::new(user, profile),
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.jwt.access_token_expiry_secs,
    }))
}

/// Activate an account from the emailed verification token.
///
/// POST /api/v1/users/verify
pub async fn verify(
    State(state): State<AppState>,
    Json(request): Json<VerifyAccountRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    request.validate()?;

    let claims = state
        .jwt
        .validate_verification_token(&request.token)
        .map_err(|e| match e {
            JwtError::TokenExpired => ApiError::Validation(VERIFICATION_EXPIRED.to_string()),
            _ => ApiError::Validation(INVALID_TOKEN.to_string()),
        })?;
    let user_id =
        extract_user_id(&claims).map_err(|_| ApiError::Validation(INVALID_TOKEN.to_string()))?;

    let repo = UserRepository::new(state.pool.clone());
    if !repo.mark_verified(user_id).await? {
        return Err(ApiError::Validation(INVALID_TOKEN.to_string()));
    }

    info!(user_id = %user_id, "Account verified");

    Ok(Json(MessageResponse {
        message: "Congratulation, now go share some rides!".to_string(),
    }))
}

/// Retrieve a user with their profile and active circles.
///
/// GET /api/v1/users/:username
pub async fn retrieve(
    State(state): State<AppState>,
    _user_auth: UserAuth,
    Path(username): Path<String>,
) -> Result<Json<UserDetailResponse>, ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    let user = find_user(&repo, &username).await?;
    let profile = load_profile(&repo, &user).await?;

    let circles: Vec<Circle> = repo
        .find_active_circles(user.id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(UserDetailResponse {
        user: UserResponse::new(user, profile),
        circles,
    }))
}

/// Update the caller's own profile.
///
/// PUT/PATCH /api/v1/users/:username/profile
pub async fn update_profile(
    State(state): State<AppState>,
    user_auth: UserAuth,
    Path(username): Path<String>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let repo = UserRepository::new(state.pool.clone());
    let user = find_user(&repo, &username).await?;

    if user.id != user_auth.user_id {
        return Err(ApiError::Forbidden(
            "You can only update your own profile.".to_string(),
        ));
    }

    request.validate()?;

    let profile = repo
        .update_profile(
            user.id,
            request.biography.as_deref(),
            request.picture.as_deref(),
        )
        .await?;

    info!(user_id = %user.id, "Profile updated");

    Ok(Json(UserResponse::new(user, profile.into())))
}

async fn find_user(repo: &UserRepository, username: &str) -> Result<User, ApiError> {
    repo.find_by_username(username)
        .await?
        .map(Into::into)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

async fn load_profile(repo: &UserRepository, user: &User) -> Result<Profile, ApiError> {
    repo.find_profile(user.id)
        .await?
        .map(Into::into)
        .ok_or_else(|| ApiError::Internal(format!("Profile missing for user {}", user.id)))
}
