// Main entry point for the whisper-inbox service

use whisper_inbox::api::{create_router, AppState};
use whisper_inbox::auth::audit_logger::AuditLogger;
use whisper_inbox::auth::auth_middleware::AuthState;
use whisper_inbox::config::Config;
use whisper_inbox::engine::mailer::{CodeMailer, LogMailer};
use whisper_inbox::state::memory_store::MemoryStore;
use whisper_inbox::state::pg_store::PgStore;
use whisper_inbox::state::{MessageStore, UserDirectory};

use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load and validate configuration first (before any logging)
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // 2. Initialize tracing subscriber; init() may only run once
    init_tracing(&config)?;

    info!("Starting whisper-inbox");
    info!(
        bind_address = %config.bind_address,
        port = config.port,
        gateway_key_required = config.gateway_key_hash.is_some(),
        "Configuration loaded"
    );

    // 3. Initialize stores (PostgreSQL if configured, memory otherwise)
    let (directory, messages, db_pool): (
        Arc<dyn UserDirectory>,
        Arc<dyn MessageStore>,
        Option<sqlx::PgPool>,
    ) = if let Some(ref database_url) = config.database_url {
        let store = Arc::new(
            PgStore::connect(database_url, config.database_max_connections)
                .await
                .map_err(|e| {
                    error!(error = %e, "Failed to initialize database store");
                    e
                })?,
        );
        info!("Database store initialized");
        let pool = store.pool().clone();
        (store.clone(), store, Some(pool))
    } else {
        warn!("DATABASE_URL not set; using in-memory store, data is lost on restart");
        let store = Arc::new(MemoryStore::new());
        (store.clone(), store, None)
    };

    // 4. Verification code delivery
    let mailer: Arc<dyn CodeMailer> = Arc::new(LogMailer);

    // 5. Auth state for owner-scoped routes
    let auth_state = Arc::new(AuthState {
        gateway_key_hash: config.gateway_key_hash.clone(),
        audit_logger: Arc::new(AuditLogger::new(db_pool)),
    });

    // 6. Application state and router
    let app_state = AppState::new(config.clone(), directory, messages, mailer)?;
    let router = create_router(&app_state, auth_state).with_state(app_state);

    info!("Router created");

    // 7. Start HTTP server
    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
        error!(error = %e, addr = %addr, "Failed to bind to address");
        e
    })?;

    info!(addr = %addr, "Server listening on {}", addr);

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| {
            error!(error = %e, "Server error");
            e
        })?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing subscriber based on configuration
fn init_tracing(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    // RUST_LOG wins over LOG_LEVEL
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_env_filter(filter);

    if config.log_format == "json" {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            info!("SIGTERM received, starting graceful shutdown");
        },
    }
}
