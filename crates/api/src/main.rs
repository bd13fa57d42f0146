use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use comparte_ride_api::{
    app::{create_app, AppState},
    config::Config,
    jobs::{AccountJobRunner, JobQueue},
    middleware,
    services::EmailService,
};
use persistence::repositories::UserRepository;
use tracing::info;

/// Time queued jobs get to finish once the server stops.
const JOB_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()?;

    // Initialize logging
    middleware::logging::init_logging(&config.logging);
    middleware::init_metrics()?;

    info!("Starting Comparte Ride API v{}", env!("CARGO_PKG_VERSION"));

    // Create database pool
    let pool = persistence::db::create_pool(&config.database.pool_config()).await?;

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    let jwt = Arc::new(config.jwt.jwt_config()?);
    let email = EmailService::new(config.email.clone());
    let queue = JobQueue::start(
        AccountJobRunner::new(UserRepository::new(pool.clone()), jwt.clone(), email),
        &config.jobs,
    );

    let addr = config.socket_addr()?;
    let state = AppState::new(config, pool, jwt, Arc::new(queue.submitter()));
    let app = create_app(state);

    // Start server
    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Draining job queue");
    queue.shutdown(JOB_DRAIN_TIMEOUT).await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
