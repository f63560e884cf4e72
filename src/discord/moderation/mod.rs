// Discord adapter for language enforcement.

pub mod chat_client;
pub mod commands;
pub mod message_handler;
