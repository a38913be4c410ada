//! Hooks run around every command invocation.

use crate::error::CommandError;
use crate::framework::{Context, Data};
use pbbot_cache::{match_prefix, RateLimitDecision};
use pbbot_common::{GuildId, UserId};
use poise::serenity_prelude as serenity;
use tracing::{debug, error, warn};

/// Reply sent when a command fails for an internal reason.
pub const INTERNAL_ERROR_REPLY: &str = "Something went wrong while running that command.";

/// Splits `content` after the first matching prefix.
pub fn split_prefix<'a, S: AsRef<str>>(content: &'a str, prefixes: &[S]) -> Option<(&'a str, &'a str)> {
    match_prefix(content, prefixes).map(|offset| content.split_at(offset))
}

/// Finds the guild's prefix at the start of `msg`. Direct messages use the
/// default prefix.
pub async fn resolve_prefix<'a>(
    _ctx: &'a serenity::Context,
    msg: &'a serenity::Message,
    data: &'a Data,
) -> Result<Option<(&'a str, &'a str)>, CommandError> {
    let guild = msg.guild_id.map(|id| GuildId(id.get()));
    let prefixes = data.cache.prefixes(guild);
    Ok(split_prefix(&msg.content, &prefixes))
}

/// Applies the global per-user rate limit.
pub async fn command_check(ctx: Context<'_>) -> Result<bool, CommandError> {
    let data = ctx.data();
    let user = UserId(ctx.author().id.get());

    match data.command_limiter.check(user, data.command_bucket()) {
        RateLimitDecision::Allowed => Ok(true),
        RateLimitDecision::Limited { retry_after } => {
            debug!("User {} is rate limited for {:?}", user, retry_after);
            Err(CommandError::OnCooldown { retry_after })
        }
    }
}

/// Counts the invocation once every check has passed.
pub async fn pre_command(ctx: Context<'_>) {
    let command = &ctx.command().qualified_name;
    debug!("{} invoked `{}`", ctx.author().name, command);
    ctx.data()
        .cache
        .record_usage(command, UserId(ctx.author().id.get()));
}

/// Global error handler for the framework.
pub async fn on_error(error: poise::FrameworkError<'_, Data, CommandError>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => report(ctx, error).await,
        poise::FrameworkError::CommandCheckFailed {
            error: Some(error),
            ctx,
            ..
        } => report(ctx, error).await,
        poise::FrameworkError::UnknownCommand { msg_content, .. } => {
            debug!("Prefix matched but no command in `{}`", msg_content);
        }
        other => {
            if let Err(e) = poise::builtins::on_error(other).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

async fn report(ctx: Context<'_>, error: CommandError) {
    let reply = match error.user_message() {
        Some(message) => message,
        None => {
            error!(
                "Error in command `{}`: {}",
                ctx.command().qualified_name,
                error
            );
            INTERNAL_ERROR_REPLY.to_string()
        }
    };

    if let Err(e) = ctx.say(reply).await {
        warn!("Failed to report command error: {}", e);
    }
}
