//! Per-server prefix management.

use crate::error::CommandResult;
use crate::framework::Context;
use pbbot_cache::DEFAULT_PREFIX;
use pbbot_common::{humanize_list, GuildId};
use tracing::info;

/// Text describing the prefixes that apply where the command was used.
pub fn prefix_overview<S: AsRef<str>>(guild: Option<GuildId>, prefixes: &[S]) -> String {
    if guild.is_none() {
        return format!(
            "My prefix is always `{DEFAULT_PREFIX}` in direct messages. You can also mention me."
        );
    }

    match prefixes {
        [only] => format!("My prefix for this server is `{}`.", only.as_ref()),
        many => format!(
            "My prefixes for this server are {}.",
            humanize_list(many)
        ),
    }
}

fn guild_of(ctx: &Context<'_>) -> Option<GuildId> {
    ctx.guild_id().map(|id| GuildId(id.get()))
}

/// Shows the prefixes for this server.
#[poise::command(prefix_command, subcommands("add", "remove", "clear"))]
pub async fn prefix(ctx: Context<'_>) -> CommandResult {
    let guild = guild_of(&ctx);
    let prefixes = ctx.data().cache.prefixes(guild);
    ctx.say(prefix_overview(guild, &prefixes)).await?;
    Ok(())
}

/// Adds a prefix for this server.
#[poise::command(prefix_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn add(
    ctx: Context<'_>,
    #[description = "Prefix to add"]
    #[rest]
    prefix: String,
) -> CommandResult {
    let Some(guild) = guild_of(&ctx) else {
        return Ok(());
    };
    ctx.data().cache.add_prefix(guild, &prefix)?;
    info!("Guild {} added prefix `{}`", guild, prefix.trim());
    ctx.say(format!(
        "Added `{}` to the list of server prefixes.",
        prefix.trim()
    ))
    .await?;
    Ok(())
}

/// Removes a prefix from this server.
#[poise::command(prefix_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn remove(
    ctx: Context<'_>,
    #[description = "Prefix to remove"]
    #[rest]
    prefix: String,
) -> CommandResult {
    let Some(guild) = guild_of(&ctx) else {
        return Ok(());
    };
    ctx.data().cache.remove_prefix(guild, &prefix)?;
    info!("Guild {} removed prefix `{}`", guild, prefix.trim());
    ctx.say(format!(
        "Removed `{}` from the list of server prefixes.",
        prefix.trim()
    ))
    .await?;
    Ok(())
}

/// Resets this server to the default prefix.
#[poise::command(prefix_command, guild_only, required_permissions = "MANAGE_GUILD")]
pub async fn clear(ctx: Context<'_>) -> CommandResult {
    let Some(guild) = guild_of(&ctx) else {
        return Ok(());
    };
    ctx.data().cache.clear_prefixes(guild)?;
    info!("Guild {} cleared its prefixes", guild);
    ctx.say("Cleared the list of server prefixes.").await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_overview_in_dms() {
        let text = prefix_overview(None, &[DEFAULT_PREFIX]);
        assert_eq!(
            text,
            "My prefix is always `pb` in direct messages. You can also mention me."
        );
    }

    #[test]
    fn test_prefix_overview_in_guild() {
        let guild = Some(GuildId(1));
        assert_eq!(
            prefix_overview(guild, &["pb"]),
            "My prefix for this server is `pb`."
        );
        assert_eq!(
            prefix_overview(guild, &["!", "?", "pb."]),
            "My prefixes for this server are `!`, `?` and `pb.`."
        );
    }
}
