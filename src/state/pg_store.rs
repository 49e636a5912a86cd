// PostgreSQL-backed directory and message store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::errors::InboxError;
use crate::core::models::{
    AppendOutcome, Message, MessageId, NewUser, PasswordHash, User, UserId,
};
use crate::state::{MessageStore, UserDirectory};

/// Database row structure for user lookup
#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    verify_code: String,
    verify_code_expiry: DateTime<Utc>,
    is_verified: bool,
    is_accepting_messages: bool,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::from(row.id),
            username: row.username,
            email: row.email,
            password_hash: PasswordHash::from_phc(row.password_hash),
            verify_code: row.verify_code,
            verify_code_expiry: row.verify_code_expiry,
            is_verified: row.is_verified,
            is_accepting_messages: row.is_accepting_messages,
        }
    }
}

#[derive(FromRow)]
struct MessageRow {
    id: Uuid,
    content: String,
    created_at: DateTime<Utc>,
}

/// Row produced by the gated insert: `is_open` is NULL when the user is unknown
#[derive(FromRow)]
struct AppendRow {
    is_open: Option<bool>,
    message_id: Option<Uuid>,
}

const USER_COLUMNS: &str = "id, username, email, password_hash, verify_code, verify_code_expiry, \
                            is_verified, is_accepting_messages";

fn store_error(context: &str, e: sqlx::Error) -> InboxError {
    InboxError::StoreError(format!("{}: {}", context, e))
}

/// Map unique violations to `Conflict`, naming the field that collided
fn insert_error(e: sqlx::Error) -> InboxError {
    if let sqlx::Error::Database(ref db) = e {
        if db.is_unique_violation() {
            let reason = match db.constraint() {
                Some("users_email_key") => "User already exists with this email",
                _ => "Username is already taken",
            };
            return InboxError::Conflict(reason.to_string());
        }
    }
    store_error("Failed to insert user", e)
}

/// PostgreSQL store; every mutation is one statement or one transaction
#[derive(Clone)]
pub struct PgStore {
    db_pool: PgPool,
}

impl PgStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Connect, then apply embedded migrations
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, InboxError> {
        let db_pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| store_error("Failed to connect to database", e))?;

        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .map_err(|e| InboxError::StoreError(format!("Failed to run migrations: {}", e)))?;

        info!(max_connections, "Database migrations applied");
        Ok(Self::new(db_pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.db_pool
    }

    async fn fetch_user(&self, clause: &str, value: &str) -> Result<Option<User>, InboxError> {
        let query = format!("SELECT {} FROM users WHERE {}", USER_COLUMNS, clause);
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(value)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(|e| store_error("Failed to look up user", e))?;
        Ok(row.map(User::from))
    }
}

#[async_trait]
impl UserDirectory for PgStore {
    async fn create_unverified_user(&self, new_user: NewUser) -> Result<UserId, InboxError> {
        let user_id = UserId::generate();
        let mut tx = self
            .db_pool
            .begin()
            .await
            .map_err(|e| store_error("Failed to begin transaction", e))?;

        // Abandoned signups give way; verified and still-pending rows stay and collide below
        let replaced = sqlx::query(
            "DELETE FROM users
             WHERE (username = $1 OR email = $2)
               AND NOT is_verified
               AND verify_code_expiry <= NOW()",
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .execute(&mut *tx)
        .await
        .map_err(|e| store_error("Failed to clear abandoned signup", e))?
        .rows_affected();

        if replaced > 0 {
            debug!(username = %new_user.username, replaced, "Replacing abandoned signup");
        }

        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, verify_code, verify_code_expiry)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user_id.as_uuid())
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(new_user.password_hash.as_str())
        .bind(&new_user.verify_code)
        .bind(new_user.verify_code_expiry)
        .execute(&mut *tx)
        .await
        .map_err(insert_error)?;

        tx.commit()
            .await
            .map_err(|e| store_error("Failed to commit registration", e))?;

        Ok(user_id)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, InboxError> {
        self.fetch_user("username = $1", username).await
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, InboxError> {
        // Username match wins if one account's username equals another's email
        self.fetch_user(
            "username = $1 OR email = $1 ORDER BY (username = $1) DESC LIMIT 1",
            identifier,
        )
        .await
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, InboxError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(user_id.as_uuid())
            .fetch_optional(&self.db_pool)
            .await
            .map_err(|e| store_error("Failed to look up user", e))?;
        Ok(row.map(User::from))
    }

    async fn mark_verified(&self, user_id: UserId) -> Result<(), InboxError> {
        let result = sqlx::query("UPDATE users SET is_verified = TRUE WHERE id = $1")
            .bind(user_id.as_uuid())
            .execute(&self.db_pool)
            .await
            .map_err(|e| store_error("Failed to mark user verified", e))?;

        if result.rows_affected() == 0 {
            return Err(InboxError::NotFound);
        }
        Ok(())
    }

    async fn set_accepting_messages(&self, user_id: UserId, value: bool) -> Result<bool, InboxError> {
        sqlx::query_scalar::<_, bool>(
            "UPDATE users SET is_accepting_messages = $2 WHERE id = $1
             RETURNING is_accepting_messages",
        )
        .bind(user_id.as_uuid())
        .bind(value)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| store_error("Failed to update accept flag", e))?
        .ok_or(InboxError::NotFound)
    }

    async fn get_accepting_messages(&self, user_id: UserId) -> Result<bool, InboxError> {
        sqlx::query_scalar::<_, bool>("SELECT is_accepting_messages FROM users WHERE id = $1")
            .bind(user_id.as_uuid())
            .fetch_optional(&self.db_pool)
            .await
            .map_err(|e| store_error("Failed to read accept flag", e))?
            .ok_or(InboxError::NotFound)
    }

    async fn ping(&self) -> Result<(), InboxError> {
        sqlx::query("SELECT 1")
            .execute(&self.db_pool)
            .await
            .map(|_| ())
            .map_err(|e| store_error("Database ping failed", e))
    }
}

#[async_trait]
impl MessageStore for PgStore {
    async fn append_if_accepting(
        &self,
        username: &str,
        message: Message,
    ) -> Result<AppendOutcome, InboxError> {
        let row = sqlx::query_as::<_, AppendRow>(
            "WITH target AS (
                 SELECT id, (is_verified AND is_accepting_messages) AS is_open
                 FROM users WHERE username = $2
             ),
             inserted AS (
                 INSERT INTO messages (id, owner_id, content, created_at)
                 SELECT $1, id, $3, $4 FROM target WHERE is_open
                 RETURNING id
             )
             SELECT (SELECT is_open FROM target) AS is_open,
                    (SELECT id FROM inserted) AS message_id",
        )
        .bind(message.id.as_uuid())
        .bind(username)
        .bind(&message.content)
        .bind(message.created_at)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| store_error("Failed to append message", e))?;

        Ok(match (row.is_open, row.message_id) {
            (None, _) => AppendOutcome::UserNotFound,
            (Some(_), Some(id)) => AppendOutcome::Appended(MessageId::from(id)),
            (Some(_), None) => AppendOutcome::NotAccepting,
        })
    }

    async fn list_messages(&self, owner: UserId) -> Result<Vec<Message>, InboxError> {
        let rows = sqlx::query_as::<_, MessageRow>(
            "SELECT id, content, created_at FROM messages
             WHERE owner_id = $1
             ORDER BY created_at DESC",
        )
        .bind(owner.as_uuid())
        .fetch_all(&self.db_pool)
        .await
        .map_err(|e| store_error("Failed to list messages", e))?;

        Ok(rows
            .into_iter()
            .map(|r| Message {
                id: MessageId::from(r.id),
                content: r.content,
                created_at: r.created_at,
            })
            .collect())
    }

    async fn delete_message(&self, owner: UserId, message_id: MessageId) -> Result<bool, InboxError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1 AND owner_id = $2")
            .bind(message_id.as_uuid())
            .bind(owner.as_uuid())
            .execute(&self.db_pool)
            .await
            .map_err(|e| store_error("Failed to delete message", e))?;
        Ok(result.rows_affected() > 0)
    }
}
