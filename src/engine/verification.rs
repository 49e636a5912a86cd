// Verification: check a submitted code against the pending one and flip the user to verified

use chrono::{DateTime, Utc};
use percent_encoding::percent_decode_str;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::credentials::codes_match;
use crate::core::errors::InboxError;
use crate::state::UserDirectory;

/// Successful verification outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verified {
    /// The code matched and the account is now verified
    Verified,
    /// The account was verified earlier; the code was not looked at
    AlreadyVerified,
}

pub struct Verifier {
    directory: Arc<dyn UserDirectory>,
}

impl Verifier {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    pub async fn verify(&self, username: &str, code: &str) -> Result<Verified, InboxError> {
        self.verify_at(username, code, Utc::now()).await
    }

    /// Verify against an explicit clock reading.
    ///
    /// Expiry is reported ahead of a mismatch: an expired code yields
    /// `CodeExpired` whether or not it matches.
    pub async fn verify_at(
        &self,
        username: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<Verified, InboxError> {
        let username = decode_username(username).ok_or(InboxError::UserNotFound)?;

        let user = self
            .directory
            .find_by_username(&username)
            .await?
            .ok_or(InboxError::UserNotFound)?;

        if user.is_verified {
            debug!(user_id = %user.id, "Verification repeated for verified user");
            return Ok(Verified::AlreadyVerified);
        }

        let is_match = codes_match(code, &user.verify_code);
        if !user.code_is_live(now) {
            debug!(user_id = %user.id, code_matched = is_match, "Verification code expired");
            return Err(InboxError::CodeExpired);
        }
        if !is_match {
            debug!(user_id = %user.id, "Verification code mismatch");
            return Err(InboxError::CodeMismatch);
        }

        self.directory.mark_verified(user.id).await.map_err(|e| match e {
            // Replaced by a re-registration between lookup and update
            InboxError::NotFound => InboxError::UserNotFound,
            other => other,
        })?;

        info!(user_id = %user.id, "User verified");
        Ok(Verified::Verified)
    }
}

/// Percent-decode a username taken from a URL; `None` if the bytes are not UTF-8
fn decode_username(raw: &str) -> Option<String> {
    percent_decode_str(raw)
        .decode_utf8()
        .ok()
        .map(|decoded| decoded.into_owned())
}
