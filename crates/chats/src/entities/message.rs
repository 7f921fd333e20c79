use chrono::{DateTime, Utc};
use parley_common::new_id;
use serde::{Deserialize, Serialize};

/// Represents a message within a chat. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Opaque identifier
    pub id: String,
    /// Chat this message belongs to
    pub chat_id: String,
    /// User who sent the message
    pub user_id: String,
    /// Message content
    pub content: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(chat_id: String, user_id: String, content: String, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            chat_id,
            user_id,
            content,
            created_at: now,
        }
    }
}
