// Domain error types - collapsed kinds so callers cannot probe for accounts or ownership

use thiserror::Error;

/// Main error type for the inbox core
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InboxError {
    /// Username or email already held (HTTP 409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// No user with that username (HTTP 404)
    #[error("User not found")]
    UserNotFound,

    /// Submitted verification code differs from the pending one (HTTP 400)
    #[error("Incorrect verification code")]
    CodeMismatch,

    /// Pending verification code is past its expiry (HTTP 400)
    #[error("Verification code has expired")]
    CodeExpired,

    /// Target user is unverified or has switched messages off (HTTP 403)
    #[error("User is not accepting messages")]
    NotAccepting,

    /// Malformed input field (HTTP 400)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Owner-scoped resource absent or owned by someone else (HTTP 404)
    #[error("Not found")]
    NotFound,

    /// Unknown identifier or wrong password (HTTP 401)
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Credentials matched but the account is still pending verification (HTTP 403)
    #[error("Account not verified")]
    AccountNotVerified,

    /// No resolved identity on an owner-scoped request (HTTP 401)
    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    /// Verification code could not be handed to the delivery collaborator (HTTP 502)
    #[error("Code delivery failed: {0}")]
    DeliveryFailed(String),

    /// Password hashing failure (HTTP 500)
    #[error("Credential error: {0}")]
    CredentialError(String),

    /// Store failure (HTTP 500)
    #[error("Store error: {0}")]
    StoreError(String),

    /// Configuration error (HTTP 500)
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl InboxError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            InboxError::Conflict(_) => 409,
            InboxError::UserNotFound => 404,
            InboxError::CodeMismatch => 400,
            InboxError::CodeExpired => 400,
            InboxError::NotAccepting => 403,
            InboxError::ValidationError(_) => 400,
            InboxError::NotFound => 404,
            InboxError::InvalidCredentials => 401,
            InboxError::AccountNotVerified => 403,
            InboxError::Unauthenticated(_) => 401,
            InboxError::DeliveryFailed(_) => 502,
            InboxError::CredentialError(_) => 500,
            InboxError::StoreError(_) => 500,
            InboxError::ConfigurationError(_) => 500,
        }
    }

    /// Get user-friendly error message (no sensitive information)
    pub fn user_message(&self) -> String {
        match self {
            InboxError::Conflict(reason) => reason.clone(),
            InboxError::UserNotFound => "User not found".to_string(),
            InboxError::CodeMismatch => "Incorrect verification code".to_string(),
            InboxError::CodeExpired => {
                "Verification code has expired, please sign up again to get a new code".to_string()
            }
            InboxError::NotAccepting => "User is not accepting messages".to_string(),
            InboxError::ValidationError(reason) => reason.clone(),
            InboxError::NotFound => "Not found".to_string(),
            InboxError::InvalidCredentials => "Invalid credentials".to_string(),
            InboxError::AccountNotVerified => "Please verify your account before signing in".to_string(),
            InboxError::Unauthenticated(_) => "Not authenticated".to_string(),
            InboxError::DeliveryFailed(_) => "Failed to send verification code".to_string(),
            InboxError::CredentialError(_) => "Internal error".to_string(),
            InboxError::StoreError(_) => "Internal error".to_string(),
            InboxError::ConfigurationError(_) => "Internal error".to_string(),
        }
    }

    /// Stable label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            InboxError::Conflict(_) => "conflict",
            InboxError::UserNotFound => "user_not_found",
            InboxError::CodeMismatch => "code_mismatch",
            InboxError::CodeExpired => "code_expired",
            InboxError::NotAccepting => "not_accepting",
            InboxError::ValidationError(_) => "validation_error",
            InboxError::NotFound => "not_found",
            InboxError::InvalidCredentials => "invalid_credentials",
            InboxError::AccountNotVerified => "account_not_verified",
            InboxError::Unauthenticated(_) => "unauthenticated",
            InboxError::DeliveryFailed(_) => "delivery_failed",
            InboxError::CredentialError(_) => "credential_error",
            InboxError::StoreError(_) => "store_error",
            InboxError::ConfigurationError(_) => "configuration_error",
        }
    }
}
