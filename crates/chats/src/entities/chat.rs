use chrono::{DateTime, Utc};
use parley_common::new_id;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Represents a chat room in the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    /// Opaque identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// User who created the chat
    pub creator_id: String,
    /// Current members, creator included
    pub participants: BTreeSet<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Chat {
    /// Create a new chat. The creator is always a participant.
    pub fn new<I>(name: String, creator_id: String, participants: I, now: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut members: BTreeSet<String> = participants.into_iter().collect();
        members.insert(creator_id.clone());

        Self {
            id: new_id(),
            name,
            creator_id,
            participants: members,
            created_at: now,
        }
    }

    pub fn is_participant(&self, user_id: &str) -> bool {
        self.participants.contains(user_id)
    }

    /// Add a member. Returns `false` if they were already present.
    pub fn add_participant(&mut self, user_id: &str) -> bool {
        if self.participants.contains(user_id) {
            return false;
        }
        self.participants.insert(user_id.to_string())
    }
}
