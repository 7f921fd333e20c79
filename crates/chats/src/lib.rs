//! # Parley Chats Crate
//!
//! This crate provides chat rooms, membership and message history for Parley.
//! All state lives in one in-memory store guarded by a single read/write lock.
//!
//! ## Architecture
//!
//! - **Entities**: Domain models (Chat, Message)
//! - **Services**: Validation and orchestration over the store
//! - **Repositories**: The chat store
//! - **Types**: Error types
//! - **Utils**: Input validation
//!
//! ## Usage
//!
//! ```rust
//! use parley_chats::ChatService;
//! use parley_config::ChatConfig;
//!
//! # async fn demo() -> Result<(), parley_chats::ChatError> {
//! let service = ChatService::from_config(&ChatConfig::default());
//! let chat = service.create_chat("alice", "general", &["bob".to_string()]).await?;
//! service.send_message(&chat.id, "bob", "hello").await?;
//! let history = service.get_messages(&chat.id, "alice", None, None).await?;
//! assert_eq!(history.len(), 1);
//! # Ok(())
//! # }
//! ```

pub mod entities;
pub mod repositories;
pub mod services;
pub mod types;
pub mod utils;

pub use entities::{Chat, Message};
pub use repositories::ChatStore;
pub use services::ChatService;
pub use types::{ChatError, ChatResult};
