// In-process store used when no database is configured, and in tests

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::core::errors::InboxError;
use crate::core::models::{AppendOutcome, Message, MessageId, NewUser, User, UserId};
use crate::state::{MessageStore, UserDirectory};

const USERNAME_TAKEN: &str = "Username is already taken";
const EMAIL_TAKEN: &str = "User already exists with this email";

struct UserRecord {
    user: User,
    messages: Vec<Message>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, UserRecord>,
    by_username: HashMap<String, UserId>,
    by_email: HashMap<String, UserId>,
}

impl Inner {
    fn remove(&mut self, user_id: UserId) {
        if let Some(record) = self.users.remove(&user_id) {
            self.by_username.remove(&record.user.username);
            self.by_email.remove(&record.user.email);
        }
    }

    fn id_for_identifier(&self, identifier: &str) -> Option<UserId> {
        self.by_username
            .get(identifier)
            .or_else(|| self.by_email.get(identifier))
            .copied()
    }
}

/// Memory-backed directory and message store.
///
/// A single `RwLock` guards all records; each trait method takes the lock
/// once, which gives the same per-record atomicity the SQL store gets from
/// single statements.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn create_unverified_user(&self, new_user: NewUser) -> Result<UserId, InboxError> {
        let now = Utc::now();
        let mut inner = self.inner.write().await;

        let holders = [
            (inner.by_username.get(&new_user.username).copied(), USERNAME_TAKEN),
            (inner.by_email.get(&new_user.email).copied(), EMAIL_TAKEN),
        ];

        let mut stale = Vec::new();
        for (holder, reason) in holders {
            let Some(holder_id) = holder else { continue };
            let Some(record) = inner.users.get(&holder_id) else { continue };
            if record.user.is_verified || record.user.code_is_live(now) {
                return Err(InboxError::Conflict(reason.to_string()));
            }
            stale.push(holder_id);
        }

        for holder_id in stale {
            inner.remove(holder_id);
        }

        let user = User {
            id: UserId::generate(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            verify_code: new_user.verify_code,
            verify_code_expiry: new_user.verify_code_expiry,
            is_verified: false,
            is_accepting_messages: true,
        };
        let user_id = user.id;

        inner.by_username.insert(user.username.clone(), user_id);
        inner.by_email.insert(user.email.clone(), user_id);
        inner.users.insert(
            user_id,
            UserRecord {
                user,
                messages: Vec::new(),
            },
        );

        Ok(user_id)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, InboxError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_username
            .get(username)
            .and_then(|id| inner.users.get(id))
            .map(|record| record.user.clone()))
    }

    async fn find_by_identifier(&self, identifier: &str) -> Result<Option<User>, InboxError> {
        let inner = self.inner.read().await;
        Ok(inner
            .id_for_identifier(identifier)
            .and_then(|id| inner.users.get(&id))
            .map(|record| record.user.clone()))
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, InboxError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(&user_id).map(|record| record.user.clone()))
    }

    async fn mark_verified(&self, user_id: UserId) -> Result<(), InboxError> {
        let mut inner = self.inner.write().await;
        let record = inner.users.get_mut(&user_id).ok_or(InboxError::NotFound)?;
        record.user.is_verified = true;
        Ok(())
    }

    async fn set_accepting_messages(&self, user_id: UserId, value: bool) -> Result<bool, InboxError> {
        let mut inner = self.inner.write().await;
        let record = inner.users.get_mut(&user_id).ok_or(InboxError::NotFound)?;
        record.user.is_accepting_messages = value;
        Ok(record.user.is_accepting_messages)
    }

    async fn get_accepting_messages(&self, user_id: UserId) -> Result<bool, InboxError> {
        let inner = self.inner.read().await;
        inner
            .users
            .get(&user_id)
            .map(|record| record.user.is_accepting_messages)
            .ok_or(InboxError::NotFound)
    }

    async fn ping(&self) -> Result<(), InboxError> {
        Ok(())
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn append_if_accepting(
        &self,
        username: &str,
        message: Message,
    ) -> Result<AppendOutcome, InboxError> {
        let mut inner = self.inner.write().await;
        let Some(user_id) = inner.by_username.get(username).copied() else {
            return Ok(AppendOutcome::UserNotFound);
        };
        let Some(record) = inner.users.get_mut(&user_id) else {
            return Ok(AppendOutcome::UserNotFound);
        };
        if !record.user.can_receive_messages() {
            return Ok(AppendOutcome::NotAccepting);
        }

        let message_id = message.id;
        record.messages.push(message);
        Ok(AppendOutcome::Appended(message_id))
    }

    async fn list_messages(&self, owner: UserId) -> Result<Vec<Message>, InboxError> {
        let inner = self.inner.read().await;
        let mut messages = inner
            .users
            .get(&owner)
            .map(|record| record.messages.clone())
            .unwrap_or_default();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(messages)
    }

    async fn delete_message(&self, owner: UserId, message_id: MessageId) -> Result<bool, InboxError> {
        let mut inner = self.inner.write().await;
        let Some(record) = inner.users.get_mut(&owner) else {
            return Ok(false);
        };
        let before = record.messages.len();
        record.messages.retain(|m| m.id != message_id);
        Ok(record.messages.len() < before)
    }
}
