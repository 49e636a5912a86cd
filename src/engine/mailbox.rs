// Owner-scoped access: accept flag and the owner's own messages

use std::sync::Arc;
use tracing::{debug, info};

use crate::core::errors::InboxError;
use crate::core::models::{Message, MessageId, UserId};
use crate::state::{MessageStore, UserDirectory};

/// Operations on an inbox by its authenticated owner.
///
/// The owner id comes from the auth collaborator; nothing here re-checks it.
pub struct Mailbox {
    directory: Arc<dyn UserDirectory>,
    messages: Arc<dyn MessageStore>,
}

impl Mailbox {
    pub fn new(directory: Arc<dyn UserDirectory>, messages: Arc<dyn MessageStore>) -> Self {
        Self {
            directory,
            messages,
        }
    }

    pub async fn accepting_messages(&self, owner: UserId) -> Result<bool, InboxError> {
        self.directory.get_accepting_messages(owner).await
    }

    pub async fn set_accepting_messages(&self, owner: UserId, value: bool) -> Result<bool, InboxError> {
        let stored = self.directory.set_accepting_messages(owner, value).await?;
        info!(user_id = %owner, accepting = stored, "Accept flag updated");
        Ok(stored)
    }

    pub async fn list_messages(&self, owner: UserId) -> Result<Vec<Message>, InboxError> {
        self.messages.list_messages(owner).await
    }

    /// Delete one of the owner's messages.
    ///
    /// `raw_message_id` is validated before any lookup. An id that exists
    /// under another owner is reported exactly like one that never existed.
    pub async fn delete_message(&self, owner: UserId, raw_message_id: &str) -> Result<MessageId, InboxError> {
        let message_id: MessageId = raw_message_id.parse()?;

        if self.messages.delete_message(owner, message_id).await? {
            info!(user_id = %owner, message_id = %message_id, "Message deleted");
            Ok(message_id)
        } else {
            debug!(user_id = %owner, message_id = %message_id, "Delete matched no owned message");
            Err(InboxError::NotFound)
        }
    }
}
