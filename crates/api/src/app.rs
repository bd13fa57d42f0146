use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use domain::services::JobSubmitter;
use shared::jwt::JwtConfig;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, require_user_auth, security_headers_middleware, trace_id,
};
use crate::routes::{circles, health, memberships, rides, users};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub jobs: Arc<dyn JobSubmitter>,
}

impl AppState {
    pub fn new(
        config: Config,
        pool: PgPool,
        jwt: Arc<JwtConfig>,
        jobs: Arc<dyn JobSubmitter>,
    ) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            jwt,
            jobs,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    let config = state.config.clone();

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Account routes that work without a session
    let account_routes = Router::new()
        .route("/api/v1/users/signup", post(users::signup))
        .route("/api/v1/users/login", post(users::login))
        .route("/api/v1/users/verify", post(users::verify));

    // Protected routes (require a user access token)
    let protected_routes = Router::new()
        .route("/api/v1/users/:username", get(users::retrieve))
        .route(
            "/api/v1/users/:username/profile",
            put(users::update_profile).patch(users::update_profile),
        )
        .route(
            "/api/v1/circles",
            get(circles::list_circles).post(circles::create_circle),
        )
        .route(
            "/api/v1/circles/:slug",
            get(circles::get_circle)
                .put(circles::update_circle)
                .patch(circles::update_circle),
        )
        .route(
            "/api/v1/circles/:slug/members",
            get(memberships::list_members).post(memberships::redeem_invitation),
        )
        .route(
            "/api/v1/circles/:slug/members/:username",
            get(memberships::get_member).delete(memberships::remove_member),
        )
        .route(
            "/api/v1/circles/:slug/members/:username/invitations",
            get(memberships::list_invitations),
        )
        .route(
            "/api/v1/circles/:slug/rides",
            get(rides::list_rides).post(rides::create_ride),
        )
        .route(
            "/api/v1/circles/:slug/rides/:ride_id",
            get(rides::get_ride).patch(rides::update_ride),
        )
        .route("/api/v1/circles/:slug/rides/:ride_id/join", post(rides::join_ride))
        .route(
            "/api/v1/circles/:slug/rides/:ride_id/finish",
            post(rides::finish_ride),
        )
        .route("/api/v1/circles/:slug/rides/:ride_id/rate", post(rides::rate_ride))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user_auth,
        ));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    // Merge all routes
    Router::new()
        .merge(public_routes)
        .merge(account_routes)
        .merge(protected_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            security_headers_middleware,
        ))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id)) // Request ID and logging
        .layer(cors)
        .with_state(state)
}
