// Security event logging

use crate::core::models::UserId;
use sqlx::PgPool;
use tracing::{debug, warn};

/// Authentication event type
#[derive(Debug, Clone)]
pub enum AuthEvent {
    IdentityAccepted { user_id: UserId },
    IdentityRejected { reason: String },
}

/// Audit logger for security events
pub struct AuditLogger {
    db_pool: Option<PgPool>,
}

impl AuditLogger {
    /// Create a new audit logger
    ///
    /// If `db_pool` is `None`, only structured logging will be used (no database persistence).
    pub fn new(db_pool: Option<PgPool>) -> Self {
        Self { db_pool }
    }

    /// Log an authentication event
    ///
    /// Fire-and-forget: spawns a task and never blocks or fails the request.
    pub fn log_auth_event(
        &self,
        event: AuthEvent,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) {
        let db_pool = self.db_pool.clone();
        let ip = ip_address.map(|s| s.to_string());
        let ua = user_agent.map(|s| s.to_string());

        tokio::spawn(async move {
            let (event_type, user_id, reason) = match event {
                AuthEvent::IdentityAccepted { user_id } => {
                    debug!(user_id = %user_id, ip_address = ?ip, "Gateway identity accepted");
                    ("IDENTITY_ACCEPTED", Some(user_id.as_uuid()), None)
                }
                AuthEvent::IdentityRejected { reason } => {
                    warn!(
                        ip_address = ?ip,
                        user_agent = ?ua,
                        reason = %reason,
                        "Gateway identity rejected"
                    );
                    ("IDENTITY_REJECTED", None, Some(reason))
                }
            };

            if let Some(pool) = db_pool {
                if let Err(e) = sqlx::query(
                    "INSERT INTO auth_audit_log (event_type, user_id, ip_address, user_agent, reason, created_at)
                     VALUES ($1, $2, $3::inet, $4, $5, NOW())",
                )
                .bind(event_type)
                .bind(user_id)
                .bind(ip.as_deref())
                .bind(&ua)
                .bind(&reason)
                .execute(&pool)
                .await
                {
                    warn!(error = %e, "Failed to write audit log to database");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_audit_logger_without_database() {
        let logger = AuditLogger::new(None);

        logger.log_auth_event(
            AuthEvent::IdentityRejected {
                reason: "Missing X-User-Id header".to_string(),
            },
            Some("127.0.0.1"),
            Some("test-agent"),
        );
        logger.log_auth_event(
            AuthEvent::IdentityAccepted {
                user_id: UserId::generate(),
            },
            None,
            None,
        );

        // Give async tasks a moment to complete
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;
    }
}
