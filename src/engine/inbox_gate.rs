// Inbox gate: admit or reject an anonymous submission

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::errors::InboxError;
use crate::core::models::{AppendOutcome, Message, MessageId};
use crate::core::validation::normalize_content;
use crate::state::MessageStore;

pub const DEFAULT_MESSAGE_MAX_CHARS: usize = 1000;

pub struct InboxGate {
    messages: Arc<dyn MessageStore>,
    max_chars: usize,
}

impl InboxGate {
    pub fn new(messages: Arc<dyn MessageStore>, max_chars: usize) -> Self {
        Self {
            messages,
            max_chars,
        }
    }

    /// Append an anonymous message to `username`'s inbox.
    ///
    /// Unverified recipients and recipients with messages switched off both
    /// produce `NotAccepting`.
    pub async fn submit(&self, username: &str, content: &str) -> Result<MessageId, InboxError> {
        let content = normalize_content(content, self.max_chars)?;
        let message = Message::new(content, Utc::now());

        match self.messages.append_if_accepting(username, message).await? {
            AppendOutcome::Appended(message_id) => {
                info!(message_id = %message_id, "Anonymous message accepted");
                Ok(message_id)
            }
            AppendOutcome::UserNotFound => {
                debug!("Submission for unknown username");
                Err(InboxError::UserNotFound)
            }
            AppendOutcome::NotAccepting => {
                debug!("Submission refused by recipient state");
                Err(InboxError::NotAccepting)
            }
        }
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }
}
