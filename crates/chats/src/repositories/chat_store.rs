//! In-memory chat store.
//!
//! Every chat and its message history lives in one arena behind a single
//! `RwLock`. Writers hold the lock for their whole critical section and
//! callers only ever receive clones, so no reader observes a half-applied
//! update.

use parley_common::{Clock, SystemClock};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::entities::{Chat, Message};
use crate::types::{ChatError, ChatResult};

struct ChatEntry {
    chat: Chat,
    // Append order is creation order.
    messages: Vec<Message>,
}

#[derive(Default)]
struct ChatArena {
    chats: HashMap<String, ChatEntry>,
    order: Vec<String>,
}

impl ChatArena {
    fn entry(&self, chat_id: &str) -> ChatResult<&ChatEntry> {
        self.chats
            .get(chat_id)
            .ok_or_else(|| ChatError::chat_not_found(chat_id))
    }

    fn entry_mut(&mut self, chat_id: &str) -> ChatResult<&mut ChatEntry> {
        self.chats
            .get_mut(chat_id)
            .ok_or_else(|| ChatError::chat_not_found(chat_id))
    }
}

/// Owner of all chats and messages
pub struct ChatStore {
    arena: RwLock<ChatArena>,
    clock: Arc<dyn Clock>,
}

impl Default for ChatStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatStore {
    pub fn new() -> Self {
        Self {
            arena: RwLock::new(ChatArena::default()),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Create a chat whose participants are the creator plus `participant_ids`,
    /// deduplicated.
    pub async fn create_chat(
        &self,
        name: &str,
        creator_id: &str,
        participant_ids: &[String],
    ) -> Chat {
        let mut arena = self.arena.write().await;

        let chat = Chat::new(
            name.to_string(),
            creator_id.to_string(),
            participant_ids.iter().cloned(),
            self.clock.now(),
        );

        arena.order.push(chat.id.clone());
        arena.chats.insert(
            chat.id.clone(),
            ChatEntry {
                chat: chat.clone(),
                messages: Vec::new(),
            },
        );

        debug!(chat_id = %chat.id, participants = chat.participants.len(), "chat created");
        chat
    }

    /// Add a member. Joining a chat twice is a successful no-op.
    pub async fn add_participant(&self, chat_id: &str, user_id: &str) -> ChatResult<Chat> {
        let mut arena = self.arena.write().await;
        let entry = arena.entry_mut(chat_id)?;

        if entry.chat.add_participant(user_id) {
            debug!(chat_id = %chat_id, user_id = %user_id, "participant added");
        }

        Ok(entry.chat.clone())
    }

    /// Append a message sent by a current participant.
    ///
    /// Membership is checked under the same write acquisition that stores the
    /// message.
    pub async fn append_message(
        &self,
        chat_id: &str,
        user_id: &str,
        content: &str,
    ) -> ChatResult<Message> {
        let mut arena = self.arena.write().await;
        let entry = arena.entry_mut(chat_id)?;

        if !entry.chat.is_participant(user_id) {
            return Err(ChatError::forbidden(chat_id, user_id));
        }

        let message = Message::new(
            chat_id.to_string(),
            user_id.to_string(),
            content.to_string(),
            self.clock.now(),
        );
        entry.messages.push(message.clone());

        Ok(message)
    }

    /// A page of messages in creation order.
    ///
    /// An offset past the end yields an empty page. An unknown chat is an
    /// error, as it is for writes.
    pub async fn list_messages(
        &self,
        chat_id: &str,
        limit: usize,
        offset: usize,
    ) -> ChatResult<Vec<Message>> {
        let arena = self.arena.read().await;
        let entry = arena.entry(chat_id)?;
        Ok(page(&entry.messages, limit, offset))
    }

    /// Like [`ChatStore::list_messages`], but only for a current participant.
    pub async fn list_messages_as(
        &self,
        reader_id: &str,
        chat_id: &str,
        limit: usize,
        offset: usize,
    ) -> ChatResult<Vec<Message>> {
        let arena = self.arena.read().await;
        let entry = arena.entry(chat_id)?;

        if !entry.chat.is_participant(reader_id) {
            return Err(ChatError::forbidden(chat_id, reader_id));
        }

        Ok(page(&entry.messages, limit, offset))
    }

    pub async fn get_chat(&self, chat_id: &str) -> ChatResult<Chat> {
        let arena = self.arena.read().await;
        Ok(arena.entry(chat_id)?.chat.clone())
    }

    /// Chats the user belongs to, oldest first
    pub async fn chats_for_user(&self, user_id: &str) -> Vec<Chat> {
        let arena = self.arena.read().await;
        arena
            .order
            .iter()
            .filter_map(|id| arena.chats.get(id))
            .filter(|entry| entry.chat.is_participant(user_id))
            .map(|entry| entry.chat.clone())
            .collect()
    }

    pub async fn message_count(&self, chat_id: &str) -> ChatResult<usize> {
        let arena = self.arena.read().await;
        Ok(arena.entry(chat_id)?.messages.len())
    }
}

fn page(messages: &[Message], limit: usize, offset: usize) -> Vec<Message> {
    if offset >= messages.len() {
        return Vec::new();
    }
    let end = offset.saturating_add(limit).min(messages.len());
    messages[offset..end].to_vec()
}
