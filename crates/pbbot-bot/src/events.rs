//! Gateway events handled outside of commands.

use pbbot_commands::prefix::prefix_overview;
use pbbot_commands::{CommandError, Data};
use pbbot_common::GuildId;
use poise::serenity_prelude as serenity;
use tracing::{info, warn};

/// Whether `content` is nothing but a mention of `bot_id`.
pub fn is_bare_mention(content: &str, bot_id: u64) -> bool {
    let content = content.trim();
    content == format!("<@{bot_id}>") || content == format!("<@!{bot_id}>")
}

/// Central event handler for Discord events.
pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    framework: poise::FrameworkContext<'_, Data, CommandError>,
    data: &Data,
) -> Result<(), CommandError> {
    data.cache.record_event(event.snake_case_name());

    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            info!(
                "Connected as {} to {} guilds",
                data_about_bot.user.name,
                data_about_bot.guilds.len()
            );
        }
        serenity::FullEvent::GuildDelete { incomplete, .. } => {
            if incomplete.unavailable {
                info!("Guild {} became unavailable", incomplete.id);
            } else {
                let guild = GuildId(incomplete.id.get());
                info!("Removed from guild {}", guild);
                if let Err(e) = data.cache.forget_guild(guild).await {
                    warn!("Failed to delete prefixes for guild {}: {}", guild, e);
                }
            }
        }
        serenity::FullEvent::Message { new_message } => {
            if !new_message.author.bot
                && is_bare_mention(&new_message.content, framework.bot_id.get())
            {
                let guild = new_message.guild_id.map(|id| GuildId(id.get()));
                let prefixes = data.cache.prefixes(guild);
                new_message
                    .reply(ctx, prefix_overview(guild, &prefixes))
                    .await?;
            }
        }
        _ => {}
    }
    Ok(())
}
