// Axum middleware resolving the gateway-forwarded identity for owner-scoped routes

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::api::responses::ApiError;
use crate::auth::audit_logger::{AuditLogger, AuthEvent};
use crate::auth::gateway_key::GatewayKey;
use crate::core::errors::InboxError;
use crate::core::models::UserId;

pub const USER_ID_HEADER: &str = "X-User-Id";
pub const GATEWAY_KEY_HEADER: &str = "X-Gateway-Key";

/// Identity resolved by the external session collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

/// Authentication state containing all dependencies
#[derive(Clone)]
pub struct AuthState {
    /// When set, requests must carry a gateway key hashing to this value
    pub gateway_key_hash: Option<String>,
    pub audit_logger: Arc<AuditLogger>,
}

/// Authentication middleware function
///
/// Checks the gateway key (when configured), parses `X-User-Id`, and puts
/// an `AuthenticatedUser` into request extensions for handlers to use.
pub async fn auth_middleware(
    State(auth_state): State<Arc<AuthState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let reject = |reason: &str, request: &Request| {
        auth_state.audit_logger.log_auth_event(
            AuthEvent::IdentityRejected {
                reason: reason.to_string(),
            },
            extract_ip_address(request.headers()).as_deref(),
            extract_user_agent(request.headers()).as_deref(),
        );
        ApiError::from(InboxError::Unauthenticated(reason.to_string()))
    };

    // 1. Gateway key
    if let Some(ref expected_hash) = auth_state.gateway_key_hash {
        let presented = extract_header(request.headers(), GATEWAY_KEY_HEADER)
            .ok_or_else(|| reject("Missing gateway key", &request))?;
        if !GatewayKey::new(&presented).matches_hash(expected_hash) {
            return Err(reject("Invalid gateway key", &request));
        }
    }

    // 2. Resolved user id
    let raw_user_id = extract_header(request.headers(), USER_ID_HEADER)
        .ok_or_else(|| reject("Missing X-User-Id header", &request))?;
    let user_id: UserId = raw_user_id
        .parse()
        .map_err(|_| reject("Malformed X-User-Id header", &request))?;

    auth_state.audit_logger.log_auth_event(
        AuthEvent::IdentityAccepted { user_id },
        extract_ip_address(request.headers()).as_deref(),
        extract_user_agent(request.headers()).as_deref(),
    );

    // 3. Set extension for handler
    request.extensions_mut().insert(AuthenticatedUser(user_id));

    Ok(next.run(request).await)
}

fn extract_header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extract IP address from request headers
///
/// Checks `X-Forwarded-For` first (for proxied requests), then `X-Real-IP`.
fn extract_ip_address(headers: &HeaderMap) -> Option<String> {
    headers
        .get("X-Forwarded-For")
        .or_else(|| headers.get("X-Real-IP"))
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
}

/// Extract user agent from request headers
fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get("User-Agent")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
