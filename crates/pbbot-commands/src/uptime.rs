//! Uptime command reading the start time from framework data.

use crate::error::CommandResult;
use crate::framework::Context;
use pbbot_common::plural;
use std::time::Duration;

/// Spells out a duration down to whole seconds, e.g. `1 day, 2 hours and 5 seconds`.
pub fn precise_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let units = [
        (secs / 86_400, "day"),
        (secs % 86_400 / 3600, "hour"),
        (secs % 3600 / 60, "minute"),
        (secs % 60, "second"),
    ];

    let parts: Vec<String> = units
        .iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, unit)| format!("{count} {}", plural(*count, unit)))
        .collect();

    match parts.as_slice() {
        [] => "0 seconds".to_string(),
        [only] => only.clone(),
        [init @ .., last] => format!("{} and {last}", init.join(", ")),
    }
}

/// Shows how long the bot has been online since the last restart.
#[poise::command(prefix_command)]
pub async fn uptime(ctx: Context<'_>) -> CommandResult {
    let uptime = ctx.data().started_at.elapsed();
    ctx.say(format!(
        "Bot has been online for **`{}`**.",
        precise_duration(uptime)
    ))
    .await?;
    Ok(())
}
