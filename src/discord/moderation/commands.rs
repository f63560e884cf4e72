// Exception list slash commands. Admin-only.

use crate::core::moderation::{ChatClient, ConversationId, ExceptionError};
use crate::discord::{Context, Error};

const ADMIN_ONLY: &str = "Sorry, this is an admin-only feature.";
// Discord message limit
const MAX_REPLY_LEN: usize = 2000;

/// Resolve the conversation and check the caller is an admin.
///
/// Replies with a refusal and returns `None` otherwise.
async fn admin_conversation(ctx: Context<'_>) -> Result<Option<ConversationId>, Error> {
    let guild_id = ctx.guild_id().ok_or("Must be used in a server")?;
    let conversation = ConversationId {
        group_id: guild_id.get(),
        channel_id: ctx.channel_id().get(),
    };
    let user_id = ctx.author().id.get();

    let is_admin = match ctx
        .data()
        .actions
        .client()
        .is_admin(conversation, user_id)
        .await
    {
        Ok(is_admin) => is_admin,
        Err(e) => {
            tracing::warn!(user_id, "Failed to check admin status: {}", e);
            false
        }
    };

    if !is_admin {
        tracing::info!(user_id, "Non-admin tried to manage exceptions");
        ctx.say(ADMIN_ONLY).await?;
        return Ok(None);
    }

    Ok(Some(conversation))
}

/// Allow a phrase in this server even if it's not in the required language.
#[poise::command(slash_command, guild_only)]
pub async fn except(
    ctx: Context<'_>,
    #[description = "Phrase to allow"] text: String,
) -> Result<(), Error> {
    let Some(conversation) = admin_conversation(ctx).await? else {
        return Ok(());
    };

    let reply = match ctx
        .data()
        .moderation
        .add_exception(conversation.group_id, &text)
        .await
    {
        Ok(entry) => format!(
            "Okay, \"{}\" has been added to the exception list.",
            entry.text
        ),
        Err(ExceptionError::EmptyText) => "Sorry, I need some text to add.".to_string(),
        Err(e) => {
            tracing::error!(group_id = conversation.group_id, "Failed to add exception: {}", e);
            format!("Sorry, an error occurred while adding \"{}\".", text.trim())
        }
    };

    ctx.say(reply).await?;
    Ok(())
}

/// Remove a phrase from this server's exception list.
#[poise::command(slash_command, guild_only)]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Phrase to remove"] text: String,
) -> Result<(), Error> {
    let Some(conversation) = admin_conversation(ctx).await? else {
        return Ok(());
    };

    let phrase = text.trim().to_lowercase();
    let reply = match ctx
        .data()
        .moderation
        .remove_exception(conversation.group_id, &text)
        .await
    {
        Ok(0) => format!("\"{}\" wasn't on the exception list.", phrase),
        Ok(_) => format!(
            "Okay, \"{}\" has been removed from the exception list.",
            phrase
        ),
        Err(ExceptionError::EmptyText) => "Sorry, I need some text to remove.".to_string(),
        Err(e) => {
            tracing::error!(group_id = conversation.group_id, "Failed to remove exception: {}", e);
            format!("Sorry, an error occurred while removing \"{}\".", phrase)
        }
    };

    ctx.say(reply).await?;
    Ok(())
}

/// Show this server's exception list.
#[poise::command(slash_command, guild_only)]
pub async fn exceptions(ctx: Context<'_>) -> Result<(), Error> {
    let Some(conversation) = admin_conversation(ctx).await? else {
        return Ok(());
    };

    let reply = match ctx
        .data()
        .moderation
        .list_exceptions(conversation.group_id)
        .await
    {
        Ok(entries) if entries.is_empty() => "The exception list is empty.".to_string(),
        Ok(entries) => format_exception_list(entries.iter().map(|e| e.text.as_str())),
        Err(e) => {
            tracing::error!(group_id = conversation.group_id, "Failed to list exceptions: {}", e);
            "Sorry, I couldn't load the exception list.".to_string()
        }
    };

    ctx.say(reply).await?;
    Ok(())
}

fn format_exception_list<'a>(texts: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::from("Exception list:\n");
    for text in texts {
        let line = format!("• {}\n", text);
        if out.len() + line.len() > MAX_REPLY_LEN - 4 {
            out.push_str("…");
            break;
        }
        out.push_str(&line);
    }
    out
}
