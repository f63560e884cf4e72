// Discord-specific language enforcement - feeds guild messages through the core
// pipeline and lets the orchestrator act on the verdict.

use crate::core::moderation::{ConversationId, IncomingMessage, ModerationAction};
use crate::discord::{Data, Error};
use poise::serenity_prelude as serenity;

/// Check a message's language and apply the resulting action.
///
/// Returns the action that was taken.
pub async fn handle_message_for_language(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> Result<ModerationAction, Error> {
    // Skip bots (including ourselves)
    if msg.author.bot {
        return Ok(ModerationAction::NoAction);
    }

    if msg.content.trim().is_empty() {
        tracing::debug!(message_id = msg.id.get(), "Message has no text, skipping");
        return Ok(ModerationAction::NoAction);
    }

    // Only enforce in guilds
    let guild_id = match msg.guild_id {
        Some(id) => id.get(),
        None => {
            tracing::debug!(user_id = msg.author.id.get(), "Message sent in a private chat");
            msg.reply(&ctx.http, "Sorry, I work only in servers.").await?;
            return Ok(ModerationAction::NoAction);
        }
    };

    let incoming = IncomingMessage {
        conversation: ConversationId {
            group_id: guild_id,
            channel_id: msg.channel_id.get(),
        },
        message_id: msg.id.get(),
        author_id: msg.author.id.get(),
        author_name: msg.author.name.clone(),
        text: msg.content.clone(),
    };

    let verdict = data.moderation.check_message(guild_id, &incoming.text).await;
    Ok(data.actions.act(&incoming, &verdict).await)
}
