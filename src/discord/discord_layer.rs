// Discord layer - commands and event handlers.

#[path = "moderation/mod.rs"]
pub mod moderation;

use crate::core::moderation::{ActionOrchestrator, ModerationService};
use crate::infra::moderation::SqliteExceptionStore;
use moderation::chat_client::DiscordChatClient;
use std::sync::Arc;

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared state available to every command and event handler.
pub struct Data {
    pub moderation: Arc<ModerationService<SqliteExceptionStore>>,
    pub actions: Arc<ActionOrchestrator<DiscordChatClient>>,
}
