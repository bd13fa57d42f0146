//! Account jobs: verification email after signup.

use async_trait::async_trait;
use domain::services::Job;
use persistence::repositories::UserRepository;
use shared::jwt::JwtConfig;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::queue::JobRunner;
use crate::services::EmailService;

/// Runs account-related jobs against the database and mail provider.
pub struct AccountJobRunner {
    users: UserRepository,
    jwt: Arc<JwtConfig>,
    email: EmailService,
}

impl AccountJobRunner {
    pub fn new(users: UserRepository, jwt: Arc<JwtConfig>, email: EmailService) -> Self {
        Self { users, jwt, email }
    }

    async fn send_confirmation_email(&self, user_id: Uuid) -> Result<(), String> {
        let user = match self
            .users
            .find_by_id(user_id)
            .await
            .map_err(|e| format!("Failed to load user: {}", e))?
        {
            Some(user) => user,
            None => {
                // Nothing to retry for an account that no longer exists.
                warn!(user_id = %user_id, "Skipping verification email for unknown user");
                return Ok(());
            }
        };

        if user.is_verified {
            info!(user_id = %user_id, "Account already verified, skipping email");
            return Ok(());
        }

        let token = self
            .jwt
            .generate_verification_token(user.id)
            .map_err(|e| format!("Failed to sign verification token: {}", e))?;

        let name = format!("{} {}", user.first_name, user.last_name);
        self.email
            .send_verification_email(&user.email, Some(name.trim()), &token)
            .await
            .map_err(|e| e.to_string())?;

        info!(user_id = %user_id, "Verification email sent");
        Ok(())
    }
}

#[async_trait]
impl JobRunner for AccountJobRunner {
    async fn run(&self, job: &Job) -> Result<(), String> {
        match job {
            Job::SendConfirmationEmail { user_id } => self.send_confirmation_email(*user_id).await,
        }
    }
}
