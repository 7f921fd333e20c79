//! Validation utilities.

use parley_config::ChatConfig;

use crate::types::ChatError;

/// Input limits applied before anything reaches the store
#[derive(Debug, Clone)]
pub struct Validator {
    max_chat_name_length: usize,
    max_message_length: usize,
}

impl Validator {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            max_chat_name_length: config.max_chat_name_length,
            max_message_length: config.max_message_length,
        }
    }

    /// Validate chat name
    pub fn chat_name(&self, name: &str) -> Result<(), ChatError> {
        if name.trim().is_empty() {
            return Err(ChatError::validation("Chat name cannot be empty"));
        }

        if name.chars().count() > self.max_chat_name_length {
            return Err(ChatError::validation(format!(
                "Chat name too long (max {} characters)",
                self.max_chat_name_length
            )));
        }

        Ok(())
    }

    /// Validate message content
    pub fn message_content(&self, content: &str) -> Result<(), ChatError> {
        if content.trim().is_empty() {
            return Err(ChatError::validation("Message content cannot be empty"));
        }

        if content.chars().count() > self.max_message_length {
            return Err(ChatError::validation(format!(
                "Message content too long (max {} characters)",
                self.max_message_length
            )));
        }

        Ok(())
    }

    /// Validate an identifier supplied by the caller
    pub fn user_id(user_id: &str) -> Result<(), ChatError> {
        if user_id.trim().is_empty() {
            return Err(ChatError::validation("User ID cannot be empty"));
        }

        if user_id.chars().any(char::is_whitespace) {
            return Err(ChatError::validation("User ID cannot contain whitespace"));
        }

        Ok(())
    }
}
