// Axum web server layer

use axum::{
    error_handling::HandleErrorLayer,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;

pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod responses;

use crate::auth::auth_middleware::{auth_middleware, AuthState};
use crate::core::codes::CodeGenerator;
use crate::core::errors::InboxError;
use crate::engine::inbox_gate::InboxGate;
use crate::engine::mailbox::Mailbox;
use crate::engine::mailer::CodeMailer;
use crate::engine::registration::Registrar;
use crate::engine::sign_in::Authenticator;
use crate::engine::verification::Verifier;
use crate::metrics::InboxMetrics;
use crate::state::{MessageStore, UserDirectory};

pub use crate::config::Config;

/// Application state containing all shared dependencies
///
/// Built once at startup; every component is behind an `Arc` and shared by
/// all requests.
#[derive(Clone)]
pub struct AppState {
    pub registrar: Arc<Registrar>,
    pub verifier: Arc<Verifier>,
    pub authenticator: Arc<Authenticator>,
    pub inbox_gate: Arc<InboxGate>,
    pub mailbox: Arc<Mailbox>,
    pub directory: Arc<dyn UserDirectory>,
    pub metrics: Arc<InboxMetrics>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the services over the given stores
    pub fn new(
        config: Config,
        directory: Arc<dyn UserDirectory>,
        messages: Arc<dyn MessageStore>,
        mailer: Arc<dyn CodeMailer>,
    ) -> Result<Self, InboxError> {
        let codes = CodeGenerator::new(config.verify_code_length, config.verify_code_ttl_secs);

        Ok(Self {
            registrar: Arc::new(Registrar::new(directory.clone(), mailer, codes)),
            verifier: Arc::new(Verifier::new(directory.clone())),
            authenticator: Arc::new(Authenticator::new(directory.clone())),
            inbox_gate: Arc::new(InboxGate::new(messages.clone(), config.message_max_chars)),
            mailbox: Arc::new(Mailbox::new(directory.clone(), messages)),
            directory,
            metrics: Arc::new(InboxMetrics::new()?),
            config: Arc::new(config),
        })
    }
}

/// Create the Axum router with all routes and middleware
///
/// Middleware stack (outermost to innermost):
/// - Request timeout (tower::timeout), converted to 408 by HandleErrorLayer
/// - Body size limit (tower-http::limit)
/// - Tracing (tower-http::trace)
/// - Auth middleware, on owner-scoped routes only
///
/// Public routes: sign-up, verify-code, sign-in, check-username-unique,
/// send-message, health, metrics.
pub fn create_router(app_state: &AppState, auth_state: Arc<AuthState>) -> Router<AppState> {
    let owner_routes = Router::new()
        .route(
            "/api/accept-messages",
            get(handlers::get_accept_messages_handler).post(handlers::set_accept_messages_handler),
        )
        .route("/api/get-messages", get(handlers::get_messages_handler))
        .route(
            "/api/delete-message/:message_id",
            delete(handlers::delete_message_handler),
        )
        .route_layer(axum::middleware::from_fn_with_state(auth_state, auth_middleware));

    let public_routes = Router::new()
        .route("/api/sign-up", post(handlers::sign_up_handler))
        .route("/api/verify-code", post(handlers::verify_code_handler))
        .route("/api/sign-in", post(handlers::sign_in_handler))
        .route(
            "/api/check-username-unique",
            get(handlers::check_username_handler),
        )
        .route("/api/send-message", post(handlers::send_message_handler))
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler));

    let body_limit = app_state.config.body_size_limit_bytes;
    let timeout_secs = app_state.config.request_timeout_secs;

    // Layers wrap in reverse order: the last one added runs first
    let router = public_routes
        .merge(owner_routes)
        .layer(middleware::tracing_layer())
        .layer(middleware::body_size_limit_layer(body_limit));

    // HandleErrorLayer must sit outside the timeout to catch its error
    let timeout_stack = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(middleware::handle_middleware_error))
        .timeout(Duration::from_secs(timeout_secs))
        .into_inner();

    router.layer(timeout_stack)
}
