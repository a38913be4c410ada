//! Command usage leaderboards.

use crate::error::CommandResult;
use crate::framework::Context;
use pbbot_cache::StatsTable;
use pbbot_common::plural;
use poise::serenity_prelude as serenity;

/// Entries shown per table.
pub const TOP_ENTRIES: usize = 5;

const MEDALS: [&str; TOP_ENTRIES] = ["🥇", "🥈", "🥉", "🏅", "🏅"];

/// Field title for a table.
pub const fn table_title(table: StatsTable) -> &'static str {
    match table {
        StatsTable::CommandsToday => "Top 5 Commands Today",
        StatsTable::CommandsOverall => "Top 5 Commands",
        StatsTable::UsersToday => "Top 5 Users Today",
        StatsTable::UsersOverall => "Top 5 Users",
    }
}

const fn empty_text(table: StatsTable) -> &'static str {
    match table {
        StatsTable::CommandsToday => "No commands have been used today.",
        StatsTable::CommandsOverall => "No commands have been used.",
        StatsTable::UsersToday => "No one has used any commands today.",
        StatsTable::UsersOverall => "No one has used any commands.",
    }
}

/// Renders one leaderboard. User tables mention the user by id.
pub fn format_top(table: StatsTable, entries: &[(String, u64)]) -> String {
    if entries.is_empty() {
        return empty_text(table).to_string();
    }

    entries
        .iter()
        .zip(MEDALS)
        .map(|((key, count), medal)| {
            let name = if table.is_users() {
                format!("<@{key}>")
            } else {
                format!("`{key}`")
            };
            format!("{medal} {name} ({count} {})", plural(*count, "use"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Shows the most used commands and the most active users.
#[poise::command(prefix_command, aliases("top"))]
pub async fn stats(ctx: Context<'_>) -> CommandResult {
    let cache = &ctx.data().cache;
    let mut embed = serenity::CreateEmbed::new()
        .title("Command Stats")
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Today is {}",
            cache.stats_day().format("%Y-%m-%d")
        )));

    for table in StatsTable::ALL {
        let entries = cache.top(table, TOP_ENTRIES);
        embed = embed.field(table_title(table), format_top(table, &entries), true);
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_commands() {
        let entries = vec![("ping".to_string(), 3), ("todo add".to_string(), 1)];
        assert_eq!(
            format_top(StatsTable::CommandsToday, &entries),
            "🥇 `ping` (3 uses)\n🥈 `todo add` (1 use)"
        );
    }

    #[test]
    fn test_format_users() {
        let entries = vec![("42".to_string(), 2)];
        assert_eq!(
            format_top(StatsTable::UsersOverall, &entries),
            "🥇 <@42> (2 uses)"
        );
    }

    #[test]
    fn test_format_empty_tables() {
        assert_eq!(
            format_top(StatsTable::UsersToday, &[]),
            "No one has used any commands today."
        );
        assert_eq!(
            format_top(StatsTable::CommandsOverall, &[]),
            "No commands have been used."
        );
    }

    #[test]
    fn test_only_five_medals() {
        let entries: Vec<_> = (0..7).map(|i| (format!("c{i}"), 7 - i)).collect();
        let text = format_top(StatsTable::CommandsOverall, &entries);
        assert_eq!(text.lines().count(), TOP_ENTRIES);
        assert!(text.lines().last().unwrap().starts_with("🏅"));
    }
}
