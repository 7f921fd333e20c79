//! Data access layer for the chat system.

pub mod chat_store;

pub use chat_store::ChatStore;
