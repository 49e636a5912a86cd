// Delivery seam for verification codes

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::core::errors::InboxError;

/// Hands a freshly issued code to whatever transport reaches the user.
///
/// Transport (SMTP, provider API) lives outside this crate.
#[async_trait]
pub trait CodeMailer: Send + Sync {
    async fn send_verification_code(
        &self,
        email: &str,
        username: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), InboxError>;
}

/// Mailer that only records the delivery request in the log.
///
/// The code itself is logged at debug level so local setups can complete
/// verification without a mail transport.
pub struct LogMailer;

#[async_trait]
impl CodeMailer for LogMailer {
    async fn send_verification_code(
        &self,
        email: &str,
        username: &str,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<(), InboxError> {
        info!(
            username = %username,
            email = %email,
            expires_at = %expires_at,
            "Verification code issued"
        );
        debug!(username = %username, code = %code, "Verification code value");
        Ok(())
    }
}
