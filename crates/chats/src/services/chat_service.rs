//! Chat service for managing chat operations.

use parley_config::ChatConfig;
use tracing::{debug, info, warn};

use crate::entities::{Chat, Message};
use crate::repositories::ChatStore;
use crate::types::{ChatError, ChatResult};
use crate::utils::Validator;

/// Service for managing chat operations
pub struct ChatService {
    store: ChatStore,
    validator: Validator,
    default_page_size: usize,
    max_page_size: usize,
}

impl ChatService {
    /// Create a new chat service over an existing store
    pub fn new(store: ChatStore, config: &ChatConfig) -> Self {
        let max_page_size = config.max_page_size.max(1);
        Self {
            store,
            validator: Validator::new(config),
            default_page_size: config.default_page_size.clamp(1, max_page_size),
            max_page_size,
        }
    }

    /// Create a chat service with an empty in-memory store
    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(ChatStore::new(), config)
    }

    pub fn store(&self) -> &ChatStore {
        &self.store
    }

    /// Create a new chat
    pub async fn create_chat(
        &self,
        creator_id: &str,
        name: &str,
        participants: &[String],
    ) -> ChatResult<Chat> {
        let name = name.trim();
        Validator::user_id(creator_id)?;
        self.validator.chat_name(name)?;
        for participant in participants {
            Validator::user_id(participant)?;
        }

        let chat = self
            .store
            .create_chat(name, creator_id, participants)
            .await;

        info!(chat_id = %chat.id, creator_id = %creator_id, "chat created");
        Ok(chat)
    }

    /// Join a chat. Joining twice is not an error.
    pub async fn connect(&self, chat_id: &str, user_id: &str) -> ChatResult<Chat> {
        Validator::user_id(user_id)?;

        let chat = self.store.add_participant(chat_id, user_id).await?;
        debug!(chat_id = %chat_id, user_id = %user_id, "connected to chat");
        Ok(chat)
    }

    /// Send a message as a current participant
    pub async fn send_message(
        &self,
        chat_id: &str,
        user_id: &str,
        content: &str,
    ) -> ChatResult<Message> {
        self.validator.message_content(content)?;

        match self.store.append_message(chat_id, user_id, content).await {
            Ok(message) => {
                debug!(chat_id = %chat_id, message_id = %message.id, "message stored");
                Ok(message)
            }
            Err(err) => {
                warn!(chat_id = %chat_id, user_id = %user_id, error = %err, "message rejected");
                Err(err)
            }
        }
    }

    /// Read a page of messages, oldest first. Only participants may read.
    ///
    /// `limit` defaults to the configured page size and is capped at the
    /// configured maximum.
    pub async fn get_messages(
        &self,
        chat_id: &str,
        user_id: &str,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> ChatResult<Vec<Message>> {
        let limit = self.page_size(limit);
        let offset = offset.unwrap_or(0);

        self.store
            .list_messages_as(user_id, chat_id, limit, offset)
            .await
    }

    /// Get a specific chat. Only participants may see it.
    pub async fn get_chat(&self, chat_id: &str, user_id: &str) -> ChatResult<Chat> {
        let chat = self.store.get_chat(chat_id).await?;
        if !chat.is_participant(user_id) {
            return Err(ChatError::forbidden(chat_id, user_id));
        }
        Ok(chat)
    }

    /// List all chats for a user
    pub async fn list_chats(&self, user_id: &str) -> ChatResult<Vec<Chat>> {
        Ok(self.store.chats_for_user(user_id).await)
    }

    fn page_size(&self, requested: Option<usize>) -> usize {
        requested
            .unwrap_or(self.default_page_size)
            .min(self.max_page_size)
    }
}
