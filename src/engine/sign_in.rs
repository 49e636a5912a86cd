// Credential check for the external session collaborator

use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::core::credentials::{hash_password_blocking, verify_password_blocking, Password};
use crate::core::errors::InboxError;
use crate::core::models::{PasswordHash, User};
use crate::state::UserDirectory;

const DUMMY_PASSWORD: &str = "whisper-inbox-absent-account";

pub struct Authenticator {
    directory: Arc<dyn UserDirectory>,
    // Verified against when the identifier is unknown, so both paths pay one argon2 check
    dummy_hash: OnceCell<PasswordHash>,
}

impl Authenticator {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            directory,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Resolve `identifier` (username or email) and check the password.
    ///
    /// Unknown identifiers and wrong passwords are both `InvalidCredentials`.
    /// Verification status is only revealed once the password has matched.
    pub async fn authenticate(&self, identifier: &str, password: Password) -> Result<User, InboxError> {
        let Some(user) = self.directory.find_by_identifier(identifier.trim()).await? else {
            let dummy = self
                .dummy_hash
                .get_or_try_init(|| hash_password_blocking(Password::new(DUMMY_PASSWORD)))
                .await?;
            verify_password_blocking(password, dummy.clone()).await?;
            debug!("Sign-in for unknown identifier");
            return Err(InboxError::InvalidCredentials);
        };

        if !verify_password_blocking(password, user.password_hash.clone()).await? {
            debug!(user_id = %user.id, "Password mismatch");
            return Err(InboxError::InvalidCredentials);
        }

        if !user.is_verified {
            return Err(InboxError::AccountNotVerified);
        }

        Ok(user)
    }

    /// Whether the stand-in hash for unknown identifiers has been built
    pub fn dummy_hash_ready(&self) -> bool {
        self.dummy_hash.initialized()
    }
}
