//! Error types for the chat system.

use parley_common::ErrorKind;
use thiserror::Error;

/// Result type alias for chat operations
pub type ChatResult<T> = Result<T, ChatError>;

/// Main error type for the chat system
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChatError {
    #[error("Chat not found: {id}")]
    ChatNotFound { id: String },

    #[error("User {user_id} is not a participant of chat {chat_id}")]
    Forbidden { chat_id: String, user_id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl ChatError {
    /// Create a not found error for chats
    pub fn chat_not_found(id: impl Into<String>) -> Self {
        Self::ChatNotFound { id: id.into() }
    }

    /// Create a membership error
    pub fn forbidden(chat_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::Forbidden {
            chat_id: chat_id.into(),
            user_id: user_id.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ChatError::ChatNotFound { .. } => ErrorKind::NotFound,
            ChatError::Forbidden { .. } => ErrorKind::Forbidden,
            ChatError::Validation { .. } => ErrorKind::Invalid,
            ChatError::Internal { .. } => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(ChatError::chat_not_found("c").kind(), ErrorKind::NotFound);
        assert_eq!(ChatError::forbidden("c", "u").kind(), ErrorKind::Forbidden);
        assert_eq!(ChatError::validation("bad").kind(), ErrorKind::Invalid);
        assert_ne!(
            ChatError::forbidden("c", "u").kind(),
            ChatError::chat_not_found("c").kind()
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ChatError::forbidden("room", "carol").to_string(),
            "User carol is not a participant of chat room"
        );
    }
}
