// Registration: validate, hash, issue a code, persist the pending user, hand off the code

use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info};

use crate::core::codes::CodeGenerator;
use crate::core::credentials::{hash_password_blocking, Password};
use crate::core::errors::InboxError;
use crate::core::models::{NewUser, UserId};
use crate::core::validation::{validate_email, validate_password_len, validate_username};
use crate::engine::mailer::CodeMailer;
use crate::state::UserDirectory;

pub struct Registrar {
    directory: Arc<dyn UserDirectory>,
    mailer: Arc<dyn CodeMailer>,
    codes: CodeGenerator,
}

impl Registrar {
    pub fn new(
        directory: Arc<dyn UserDirectory>,
        mailer: Arc<dyn CodeMailer>,
        codes: CodeGenerator,
    ) -> Self {
        Self {
            directory,
            mailer,
            codes,
        }
    }

    /// Create a pending account and send its verification code.
    ///
    /// The record is persisted before delivery; a delivery failure leaves it
    /// in place so a later sign-up after expiry can replace it.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: Password,
    ) -> Result<UserId, InboxError> {
        let username = username.trim();
        let email = email.trim();
        validate_username(username)?;
        validate_email(email)?;
        validate_password_len(password.char_len())?;

        let password_hash = hash_password_blocking(password).await?;
        let issued = self.codes.generate(Utc::now());

        let user_id = self
            .directory
            .create_unverified_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                verify_code: issued.code.clone(),
                verify_code_expiry: issued.expires_at,
            })
            .await?;

        info!(user_id = %user_id, username = %username, "Pending user registered");

        self.mailer
            .send_verification_code(email, username, &issued.code, issued.expires_at)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %user_id, "Verification code delivery failed");
                match e {
                    InboxError::DeliveryFailed(_) => e,
                    other => InboxError::DeliveryFailed(other.to_string()),
                }
            })?;

        Ok(user_id)
    }

    /// Whether no verified account holds `username`.
    ///
    /// A live pending signup can still make `register` fail with `Conflict`.
    pub async fn username_available(&self, username: &str) -> Result<bool, InboxError> {
        validate_username(username)?;
        let holder = self.directory.find_by_username(username).await?;
        Ok(!holder.is_some_and(|user| user.is_verified))
    }
}
