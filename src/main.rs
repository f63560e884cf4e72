// This is the entry point of the language enforcement bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of core traits (databases, APIs)
// - `discord/` = Discord-specific adapters (commands, events)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework
// 4. Register commands and event handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::AppConfig;
use crate::core::moderation::{ActionOrchestrator, ModerationService};
use crate::core::translation::{TranslationProvider, TranslatorService};
use crate::discord::moderation::chat_client::DiscordChatClient;
use crate::discord::moderation::message_handler::handle_message_for_language;
use crate::discord::{Data, Error};
use crate::infra::moderation::SqliteExceptionStore;
use crate::infra::translation::{GoogleCloudClient, GoogleFreeClient};
use poise::serenity_prelude as serenity;
use std::sync::Arc;

/// Event handler for non-command Discord events.
/// Every guild message goes through language enforcement.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::Message { new_message } = event {
        // Errors here are per-message; log and keep going.
        if let Err(e) = handle_message_for_language(ctx, new_message, data).await {
            tracing::error!(
                message_id = new_message.id.get(),
                "Error enforcing language on message: {}",
                e
            );
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let config = AppConfig::from_env().expect(
        "Missing configuration! Create a .env file with at least DISCORD_TOKEN set.",
    );

    tracing::info!(
        required_language = %config.moderation.required_language,
        be_helpful = config.moderation.be_helpful,
        mute_people = config.moderation.mute_people,
        mute_timeout_secs = config.moderation.mute_timeout.as_secs(),
        paid_fallback = config.gcp_api_key.is_some(),
        "Loaded configuration"
    );

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Create our services with their dependencies.
    // This is the "composition root" where we wire everything together.

    let exception_store = SqliteExceptionStore::connect(&config.database_url)
        .await
        .expect("Failed to initialize exception store");

    // Free endpoint first, paid API as fallback
    let http_client = reqwest::Client::new();
    let mut providers: Vec<Box<dyn TranslationProvider>> =
        vec![Box::new(GoogleFreeClient::new(http_client.clone()))];
    if let Some(key) = config.gcp_api_key.clone() {
        providers.push(Box::new(GoogleCloudClient::new(http_client, key)));
    }
    let translator = TranslatorService::new(providers);
    tracing::info!(
        providers = translator.provider_count(),
        "Translation providers ready"
    );

    let moderation_service = Arc::new(ModerationService::new(
        exception_store,
        translator,
        config.moderation.clone(),
    ));

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::DIRECT_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS;

    let moderation_config = config.moderation.clone();

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                discord::moderation::commands::except(),
                discord::moderation::commands::remove(),
                discord::moderation::commands::exceptions(),
            ],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("Bot is starting up...");

                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tracing::info!("Commands registered");

                // The chat client needs the live HTTP client and cache, so the
                // orchestrator is built here rather than above.
                let chat_client = Arc::new(DiscordChatClient::new(
                    ctx.http.clone(),
                    ctx.cache.clone(),
                ));
                let actions = Arc::new(ActionOrchestrator::new(chat_client, moderation_config));

                tracing::info!("Bot is ready");
                Ok(Data {
                    moderation: moderation_service,
                    actions,
                })
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await
        .expect("Error creating client");

    client.start().await.expect("Error running bot");
}
