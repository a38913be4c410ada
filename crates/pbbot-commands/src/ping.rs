//! Latency report for the gateway, the HTTP API and the database.

use crate::error::{CommandError, CommandResult};
use crate::framework::Context;
use pbbot_cache::RateLimitDecision;
use pbbot_common::ChannelId;
use poise::serenity_prelude as serenity;
use std::time::{Duration, Instant};

/// API readings taken for a round-trip report.
pub const ROUND_TRIP_READINGS: usize = 5;

/// Parses the flags given to `ping`. Returns whether round-trip readings were
/// requested.
pub fn parse_ping_flags(flags: &str) -> Result<bool, CommandError> {
    let mut round_trip = false;
    for flag in flags.split_whitespace() {
        match flag.to_lowercase().as_str() {
            "-rtt" | "--round-trip-time" => round_trip = true,
            other => {
                return Err(CommandError::InvalidArgument(format!(
                    "Unknown flag `{other}`. The only flag is `-rtt|--round-trip-time`."
                )))
            }
        }
    }
    Ok(round_trip)
}

/// Formats a latency in milliseconds as a code block.
pub fn format_latency(latency: Duration) -> String {
    format!("```py\n{:.5}ms```", latency.as_secs_f64() * 1000.0)
}

/// Formats numbered round-trip readings as a code block.
pub fn format_readings(readings: &[Duration]) -> String {
    let lines: Vec<String> = readings
        .iter()
        .enumerate()
        .map(|(i, reading)| format!("Reading {}: {:.5}ms", i + 1, reading.as_secs_f64() * 1000.0))
        .collect();
    format!("```py\n{}```", lines.join("\n"))
}

async fn api_ping(ctx: Context<'_>) -> CommandResult<Duration> {
    let started = Instant::now();
    ctx.channel_id().broadcast_typing(ctx.http()).await?;
    Ok(started.elapsed())
}

/// Shows the websocket latency, API response time and database ping.
///
/// Pass `-rtt` or `--round-trip-time` to also take several API readings.
#[poise::command(prefix_command)]
pub async fn ping(
    ctx: Context<'_>,
    #[description = "-rtt|--round-trip-time"]
    #[rest]
    flags: Option<String>,
) -> CommandResult {
    let round_trip = parse_ping_flags(flags.as_deref().unwrap_or_default())?;
    let data = ctx.data();

    if round_trip {
        let channel = ChannelId(ctx.channel_id().get());
        if let RateLimitDecision::Limited { retry_after } =
            data.round_trip_limiter.check(channel, data.round_trip_bucket())
        {
            return Err(CommandError::OnCooldown { retry_after });
        }
    }

    let websocket = ctx.ping().await;
    let first_api = api_ping(ctx).await?;
    let database = data.cache.store().ping().await?;

    let mut embed = serenity::CreateEmbed::new()
        .title("Pong!")
        .field("Websocket Latency", format_latency(websocket), true)
        .field("API Response Time", format_latency(first_api), true)
        .field("Database Ping", format_latency(database), true);

    if round_trip {
        let mut readings = vec![first_api];
        for _ in 1..ROUND_TRIP_READINGS {
            readings.push(api_ping(ctx).await?);
        }
        embed = embed.field("Round-Trip Time", format_readings(&readings), false);
    }

    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flags() {
        assert!(!parse_ping_flags("").unwrap());
        assert!(parse_ping_flags("-rtt").unwrap());
        assert!(parse_ping_flags("--round-trip-time").unwrap());
        assert!(parse_ping_flags("-RTT").unwrap());
        assert!(matches!(
            parse_ping_flags("--fast"),
            Err(CommandError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_format_latency() {
        assert_eq!(format_latency(Duration::from_micros(1500)), "```py\n1.50000ms```");
    }

    #[test]
    fn test_format_readings() {
        let text = format_readings(&[Duration::from_millis(2), Duration::from_millis(3)]);
        assert_eq!(text, "```py\nReading 1: 2.00000ms\nReading 2: 3.00000ms```");
    }
}
