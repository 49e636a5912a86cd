// Store seams: user directory and message store

use async_trait::async_trait;

use crate::core::errors::InboxError;
use crate::core::models::{AppendOutcome, Message, MessageId, NewUser, User, UserId};

pub mod memory_store;
pub mod pg_store;

/// Durable user records.
///
/// Every mutation is atomic at single-record granularity. Callers never
/// read-then-write through this trait to implement a mutation.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Persist a pending user, replacing abandoned (unverified and expired)
    /// records that hold the same username or email.
    async fn create_unverified_user(&self, new_user: NewUser) -> Result<UserId, InboxError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, InboxError>;

    /// Lookup by username or email, for the sign-in collaborator
    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, InboxError>;

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, InboxError>;

    /// Idempotent; `NotFound` only when the user is absent
    async fn mark_verified(&self, user_id: UserId) -> Result<(), InboxError>;

    /// Overwrite the accept flag and return the stored value
    async fn set_accepting_messages(&self, user_id: UserId, value: bool) -> Result<bool, InboxError>;

    async fn get_accepting_messages(&self, user_id: UserId) -> Result<bool, InboxError>;

    async fn ping(&self) -> Result<(), InboxError>;
}

/// Ownership-scoped message log
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Check the recipient's eligibility and append in one atomic step
    async fn append_if_accepting(
        &self,
        username: &str,
        message: Message,
    ) -> Result<AppendOutcome, InboxError>;

    /// Messages owned by `owner`, newest first
    async fn list_messages(&self, owner: UserId) -> Result<Vec<Message>, InboxError>;

    /// Delete by the (owner, id) pair; `false` when no such pair exists
    async fn delete_message(&self, owner: UserId, message_id: MessageId) -> Result<bool, InboxError>;
}
