// Discord implementation of the core ChatClient port.
//
// - Group = guild, conversation = channel
// - Admin = guild owner, or ADMINISTRATOR / MANAGE_MESSAGES permission
// - Restrict = SEND_MESSAGES denied in the member's overwrite on the channel,
//   other bits of that overwrite left alone
// - Unrestrict = the overwrite put back the way it was before the mute

use crate::core::moderation::{ChatClient, ChatError, ConversationId};
use async_trait::async_trait;
use dashmap::DashMap;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

type OverwriteKey = (serenity::ChannelId, serenity::UserId);

pub struct DiscordChatClient {
    http: Arc<serenity::Http>,
    cache: Arc<serenity::Cache>,
    /// Member overwrites as they were before the mute; `None` if there was none.
    saved_overwrites: DashMap<OverwriteKey, Option<serenity::PermissionOverwrite>>,
}

impl DiscordChatClient {
    pub fn new(http: Arc<serenity::Http>, cache: Arc<serenity::Cache>) -> Self {
        Self {
            http,
            cache,
            saved_overwrites: DashMap::new(),
        }
    }

    async fn member_overwrite(
        &self,
        channel_id: serenity::ChannelId,
        user_id: serenity::UserId,
    ) -> Result<Option<serenity::PermissionOverwrite>, ChatError> {
        let channel = channel_id
            .to_channel(self.http.as_ref())
            .await
            .map_err(platform_error)?
            .guild()
            .ok_or(ChatError::NotInGroup)?;

        Ok(channel
            .permission_overwrites
            .into_iter()
            .find(|o| o.kind == serenity::PermissionOverwriteType::Member(user_id)))
    }
}

/// The member's overwrite with sending denied and everything else kept.
fn muted_overwrite(
    existing: Option<&serenity::PermissionOverwrite>,
    user_id: serenity::UserId,
) -> serenity::PermissionOverwrite {
    let (allow, deny) = existing
        .map(|o| (o.allow, o.deny))
        .unwrap_or((serenity::Permissions::empty(), serenity::Permissions::empty()));

    serenity::PermissionOverwrite {
        allow: allow - serenity::Permissions::SEND_MESSAGES,
        deny: deny | serenity::Permissions::SEND_MESSAGES,
        kind: serenity::PermissionOverwriteType::Member(user_id),
    }
}

/// Clear the send denial from an overwrite. `None` when nothing is left.
fn lifted_overwrite(
    current: serenity::PermissionOverwrite,
) -> Option<serenity::PermissionOverwrite> {
    let deny = current.deny - serenity::Permissions::SEND_MESSAGES;
    if deny.is_empty() && current.allow.is_empty() {
        return None;
    }

    Some(serenity::PermissionOverwrite {
        allow: current.allow,
        deny,
        kind: current.kind,
    })
}

/// Reply builder. Only the replied-to author may be pinged, so echoed
/// user text can't mention everyone or a role.
fn reply_message(
    text: &str,
    reference: Option<(serenity::ChannelId, serenity::MessageId)>,
) -> serenity::CreateMessage {
    let mut builder = serenity::CreateMessage::new()
        .content(text)
        .allowed_mentions(serenity::CreateAllowedMentions::new().replied_user(true));
    if let Some(reference) = reference {
        builder = builder.reference_message(reference);
    }
    builder
}

fn platform_error(err: serenity::Error) -> ChatError {
    ChatError::Platform(err.to_string())
}

#[async_trait]
impl ChatClient for DiscordChatClient {
    async fn send_reply(
        &self,
        conversation: ConversationId,
        reply_to: Option<u64>,
        text: &str,
    ) -> Result<(), ChatError> {
        let channel_id = serenity::ChannelId::new(conversation.channel_id);

        let reference = reply_to.map(|id| (channel_id, serenity::MessageId::new(id)));
        let builder = reply_message(text, reference);

        channel_id
            .send_message(&self.http, builder)
            .await
            .map_err(platform_error)?;
        Ok(())
    }

    async fn is_admin(
        &self,
        conversation: ConversationId,
        actor_id: u64,
    ) -> Result<bool, ChatError> {
        let guild_id = serenity::GuildId::new(conversation.group_id);
        let user_id = serenity::UserId::new(actor_id);

        let member = guild_id
            .member(&self.http, user_id)
            .await
            .map_err(platform_error)?;

        // Cache guard must be dropped before anything else is awaited.
        let permissions = {
            let guild = self.cache.guild(guild_id).ok_or(ChatError::NotInGroup)?;
            if guild.owner_id == user_id {
                return Ok(true);
            }
            guild.member_permissions(&member)
        };

        Ok(permissions.administrator() || permissions.manage_messages())
    }

    async fn restrict(&self, conversation: ConversationId, actor_id: u64) -> Result<(), ChatError> {
        let channel_id = serenity::ChannelId::new(conversation.channel_id);
        let user_id = serenity::UserId::new(actor_id);

        let existing = self.member_overwrite(channel_id, user_id).await?;
        channel_id
            .create_permission(&self.http, muted_overwrite(existing.as_ref(), user_id))
            .await
            .map_err(platform_error)?;

        // Overlapping mutes keep the snapshot from before the first one.
        self.saved_overwrites
            .entry((channel_id, user_id))
            .or_insert(existing);
        Ok(())
    }

    async fn unrestrict(
        &self,
        conversation: ConversationId,
        actor_id: u64,
    ) -> Result<(), ChatError> {
        let channel_id = serenity::ChannelId::new(conversation.channel_id);
        let user_id = serenity::UserId::new(actor_id);

        let restored = match self.saved_overwrites.remove(&(channel_id, user_id)) {
            Some((_, previous)) => previous,
            // No snapshot (e.g. the bot restarted mid-mute): just clear the denial.
            None => self
                .member_overwrite(channel_id, user_id)
                .await?
                .and_then(lifted_overwrite),
        };

        match restored {
            Some(overwrite) => channel_id
                .create_permission(&self.http, overwrite)
                .await
                .map_err(platform_error),
            None => channel_id
                .delete_permission(
                    &self.http,
                    serenity::PermissionOverwriteType::Member(user_id),
                )
                .await
                .map_err(platform_error),
        }
    }
}
