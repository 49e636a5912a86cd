// Request handlers for API endpoints

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    Extension,
};
use tracing::{error, info, warn};

use crate::api::extract::{ApiJson, ApiPath, ApiQuery};
use crate::api::responses::{
    AcceptFlagResponse, AcceptMessagesRequest, ApiError, HealthResponse, MessageResponse,
    MessagesResponse, SendMessageRequest, SendMessageResponse, SignInRequest, SignInResponse,
    SignUpRequest, SignUpResponse, UsernameAvailabilityResponse, UsernameQuery, VerifyCodeRequest,
};
use crate::api::AppState;
use crate::auth::auth_middleware::AuthenticatedUser;
use crate::core::credentials::Password;
use crate::core::errors::InboxError;
use crate::engine::verification::Verified;

/// Extract request ID from headers or generate a UUID
fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

/// Count the outcome, log server-side failures, and attach the request ID
fn finish<T>(
    app_state: &AppState,
    operation: &str,
    request_id: &str,
    result: Result<T, InboxError>,
) -> Result<T, ApiError> {
    app_state.metrics.record(operation, &result);
    result.map_err(|e| {
        if e.status_code() >= 500 {
            error!(error = %e, operation, request_id = %request_id, "Operation failed");
        }
        ApiError::from_inbox_error_with_id(e, request_id.to_string())
    })
}

/// POST /api/sign-up
pub async fn sign_up_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<SignUpRequest>,
) -> Result<(StatusCode, Json<SignUpResponse>), ApiError> {
    let request_id = request_id(&headers);
    let result = app_state
        .registrar
        .register(&request.username, &request.email, Password::new(&request.password))
        .await;
    let user_id = finish(&app_state, "register", &request_id, result)?;

    Ok((
        StatusCode::CREATED,
        Json(SignUpResponse {
            success: true,
            message: "User registered successfully. Please verify your account.".to_string(),
            user_id,
        }),
    ))
}

/// POST /api/verify-code
pub async fn verify_code_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<VerifyCodeRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let request_id = request_id(&headers);
    let result = app_state.verifier.verify(&request.username, &request.code).await;
    let outcome = finish(&app_state, "verify", &request_id, result)?;

    let message = match outcome {
        Verified::Verified => "Account verified successfully",
        Verified::AlreadyVerified => "Account is already verified",
    };
    Ok(Json(MessageResponse::ok(message)))
}

/// POST /api/sign-in
///
/// Credential check for the session collaborator; it mints its own session.
pub async fn sign_in_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<SignInRequest>,
) -> Result<Json<SignInResponse>, ApiError> {
    let request_id = request_id(&headers);
    let result = app_state
        .authenticator
        .authenticate(&request.identifier, Password::new(&request.password))
        .await;
    let user = finish(&app_state, "sign_in", &request_id, result)?;

    Ok(Json(SignInResponse {
        success: true,
        message: "Signed in".to_string(),
        user_id: user.id,
        username: user.username,
        is_verified: user.is_verified,
        is_accepting_messages: user.is_accepting_messages,
    }))
}

/// GET /api/check-username-unique?username=
pub async fn check_username_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    ApiQuery(query): ApiQuery<UsernameQuery>,
) -> Result<Json<UsernameAvailabilityResponse>, ApiError> {
    let request_id = request_id(&headers);
    let result = app_state.registrar.username_available(&query.username).await;
    let available = finish(&app_state, "check_username", &request_id, result)?;

    let message = if available {
        "Username is available"
    } else {
        "Username is already taken"
    };
    Ok(Json(UsernameAvailabilityResponse {
        success: true,
        message: message.to_string(),
        available,
    }))
}

/// GET /api/accept-messages
pub async fn get_accept_messages_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Extension(AuthenticatedUser(owner)): Extension<AuthenticatedUser>,
) -> Result<Json<AcceptFlagResponse>, ApiError> {
    let request_id = request_id(&headers);
    let result = app_state.mailbox.accepting_messages(owner).await;
    let accepting = finish(&app_state, "get_accept_flag", &request_id, result)?;

    Ok(Json(AcceptFlagResponse {
        success: true,
        message: "Accept flag retrieved".to_string(),
        is_accepting_message: accepting,
    }))
}

/// POST /api/accept-messages
pub async fn set_accept_messages_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Extension(AuthenticatedUser(owner)): Extension<AuthenticatedUser>,
    ApiJson(request): ApiJson<AcceptMessagesRequest>,
) -> Result<Json<AcceptFlagResponse>, ApiError> {
    let request_id = request_id(&headers);
    let result = app_state
        .mailbox
        .set_accepting_messages(owner, request.accept_messages)
        .await;
    let accepting = finish(&app_state, "set_accept_flag", &request_id, result)?;

    let message = if accepting {
        "Messages are now accepted"
    } else {
        "Messages are no longer accepted"
    };
    Ok(Json(AcceptFlagResponse {
        success: true,
        message: message.to_string(),
        is_accepting_message: accepting,
    }))
}

/// POST /api/send-message
///
/// Anonymous: no identity is read or required.
pub async fn send_message_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    ApiJson(request): ApiJson<SendMessageRequest>,
) -> Result<(StatusCode, Json<SendMessageResponse>), ApiError> {
    let request_id = request_id(&headers);
    let result = app_state
        .inbox_gate
        .submit(&request.username, &request.content)
        .await;
    let message_id = finish(&app_state, "submit_message", &request_id, result)?;

    Ok((
        StatusCode::CREATED,
        Json(SendMessageResponse {
            success: true,
            message: "Message sent successfully".to_string(),
            message_id,
        }),
    ))
}

/// GET /api/get-messages
pub async fn get_messages_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Extension(AuthenticatedUser(owner)): Extension<AuthenticatedUser>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let request_id = request_id(&headers);
    let result = app_state.mailbox.list_messages(owner).await;
    let messages = finish(&app_state, "list_messages", &request_id, result)?;

    Ok(Json(MessagesResponse {
        success: true,
        message: format!("{} message(s)", messages.len()),
        messages,
    }))
}

/// DELETE /api/delete-message/:message_id
pub async fn delete_message_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    Extension(AuthenticatedUser(owner)): Extension<AuthenticatedUser>,
    ApiPath(message_id): ApiPath<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let request_id = request_id(&headers);
    let result = app_state.mailbox.delete_message(owner, &message_id).await;
    finish(&app_state, "delete_message", &request_id, result)?;

    Ok(Json(MessageResponse::ok("Message deleted")))
}

/// Health check handler
///
/// GET /health
///
/// Pings the backing store with a short timeout; a slow store reports as
/// degraded rather than failing the probe.
pub async fn health_handler(State(app_state): State<AppState>) -> Json<HealthResponse> {
    let store_status = match tokio::time::timeout(
        std::time::Duration::from_millis(800),
        app_state.directory.ping(),
    )
    .await
    {
        Ok(Ok(())) => "connected".to_string(),
        Ok(Err(e)) => {
            warn!(error = %e, "Store ping failed");
            "disconnected".to_string()
        }
        Err(_) => {
            info!("Store ping timed out in health check");
            "slow: timeout".to_string()
        }
    };

    let status = if store_status == "connected" {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        store: store_status,
    })
}

/// Metrics handler
///
/// GET /metrics
///
/// Returns Prometheus metrics in text format
pub async fn metrics_handler(State(app_state): State<AppState>) -> Result<String, ApiError> {
    app_state.metrics.render().map_err(ApiError::from)
}
