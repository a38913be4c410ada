//! Tally of gateway events received since start.

use crate::error::CommandResult;
use crate::framework::Context;
use std::time::Duration;

/// Event names listed in one reply.
pub const SOCKET_STATS_ENTRIES: usize = 20;

/// Renders the event tally with the overall rate per minute.
pub fn format_socket_stats(entries: &[(String, u64)], total: u64, elapsed: Duration) -> String {
    if entries.is_empty() {
        return "No gateway events have been received yet.".to_string();
    }

    let minutes = (elapsed.as_secs_f64() / 60.0).max(1.0 / 60.0);
    #[allow(clippy::cast_precision_loss)]
    let per_minute = total as f64 / minutes;

    let width = entries.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let lines: Vec<String> = entries
        .iter()
        .map(|(name, count)| format!("{name:<width$}  {count}"))
        .collect();

    format!(
        "{total} socket events observed ({per_minute:.2}/minute)\n```\n{}```",
        lines.join("\n")
    )
}

/// Shows how many of each gateway event the bot has received.
#[poise::command(prefix_command)]
pub async fn socketstats(ctx: Context<'_>) -> CommandResult {
    let data = ctx.data();
    let entries = data.cache.top_events(SOCKET_STATS_ENTRIES);
    let total = data.cache.total_events();
    ctx.say(format_socket_stats(&entries, total, data.started_at.elapsed()))
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_socket_stats() {
        let entries = vec![("message".to_string(), 90), ("guild_create".to_string(), 30)];
        let text = format_socket_stats(&entries, 120, Duration::from_secs(120));

        assert!(text.starts_with("120 socket events observed (60.00/minute)"));
        assert!(text.contains("message       90"));
        assert!(text.contains("guild_create  30"));
    }

    #[test]
    fn test_format_empty_tally() {
        assert_eq!(
            format_socket_stats(&[], 0, Duration::from_secs(5)),
            "No gateway events have been received yet."
        );
    }

    #[test]
    fn test_rate_right_after_start() {
        let entries = vec![("ready".to_string(), 1)];
        let text = format_socket_stats(&entries, 1, Duration::ZERO);
        assert!(text.contains("(60.00/minute)"));
    }
}
