//! Process lifecycle: store, cache, scheduler and Discord client.

use crate::error::BotResult;
use crate::events::event_handler;
use crate::presence::DiscordPresence;
use pbbot_cache::{PersistentCache, PresenceSink, Scheduler, SchedulerOptions, SqliteStore};
use pbbot_commands::{framework_options, CommandError, Data};
use pbbot_config::Config;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Gateway intents the bot needs for prefix commands in guilds and DMs.
pub fn intents() -> serenity::GatewayIntents {
    serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::DIRECT_MESSAGES
}

/// Connects the store and loads the cache from it. Any failure is fatal.
pub async fn open_cache(config: &Config) -> BotResult<(Arc<SqliteStore>, Arc<PersistentCache>)> {
    let store = Arc::new(SqliteStore::connect(&config.database).await?);
    let cache = Arc::new(PersistentCache::new(store.clone()));
    cache.load_all().await?;
    info!("Cache loaded");
    Ok((store, cache))
}

async fn setup(
    ctx: &serenity::Context,
    ready: &serenity::Ready,
    data: Data,
    presence: Arc<DiscordPresence>,
) -> Result<Data, CommandError> {
    info!("Bot connected as: {} ({})", ready.user.name, ready.user.id);
    presence.attach(ctx.clone());
    if let Err(e) = presence.refresh().await {
        warn!("Initial presence refresh failed: {}", e);
    }
    Ok(data)
}

/// Main bot structure.
pub struct PbBot {
    config: Arc<Config>,
}

impl PbBot {
    /// Creates a new bot instance.
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Runs the bot until the gateway shuts down, then stops the scheduler
    /// (writing the cache one last time) and closes the store.
    pub async fn run(&self) -> BotResult<()> {
        let (store, cache) = open_cache(&self.config).await?;

        let presence = Arc::new(DiscordPresence::new());
        let scheduler = Scheduler::start(
            cache.clone(),
            SchedulerOptions::from(&self.config.scheduling),
            Some(presence.clone() as Arc<dyn PresenceSink>),
        );

        let data = Data::new(self.config.clone(), cache);
        let mut options = framework_options(&self.config);
        options.event_handler = |ctx, event, framework, data| {
            Box::pin(event_handler(ctx, event, framework, data))
        };

        let framework = poise::Framework::builder()
            .options(options)
            .setup(move |ctx, ready, _framework| Box::pin(setup(ctx, ready, data, presence)))
            .build();

        let client = serenity::ClientBuilder::new(&self.config.discord.token, intents())
            .framework(framework)
            .await;

        let result: BotResult<()> = match client {
            Ok(mut client) => {
                let shard_manager = client.shard_manager.clone();
                tokio::spawn(async move {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        error!("Failed to listen for shutdown signal: {:?}", e);
                        return;
                    }
                    info!("Received shutdown signal, starting graceful shutdown");
                    shard_manager.shutdown_all().await;
                });

                info!("PB Bot is starting up...");
                client.start().await.map_err(Into::into)
            }
            Err(e) => Err(e.into()),
        };

        if let Err(e) = &result {
            error!("Client error: {}", e);
        }

        if let Err(e) = scheduler.shutdown().await {
            error!("Cache could not be written on shutdown: {}", e);
        }
        store.close().await;
        info!("PB Bot has shut down");
        result
    }
}

impl std::fmt::Debug for PbBot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PbBot").field("config", &"<Config>").finish()
    }
}
