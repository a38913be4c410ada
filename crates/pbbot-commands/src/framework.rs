//! Poise framework setup and command registration logic.

use crate::dispatch::{command_check, on_error, pre_command, resolve_prefix};
use crate::error::CommandError;
use pbbot_cache::{BucketConfig, PersistentCache, RateLimiter};
use pbbot_common::{ChannelId, UserId};
use pbbot_config::Config;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use std::time::Instant;

/// Application data accessible in all commands.
pub struct Data {
    /// Application configuration.
    pub config: Arc<Config>,
    /// Prefixes, todo lists and usage counters.
    pub cache: Arc<PersistentCache>,
    /// Global per-user command limiter.
    pub command_limiter: RateLimiter<UserId>,
    /// Per-channel limiter for round-trip pings.
    pub round_trip_limiter: RateLimiter<ChannelId>,
    /// When the process started.
    pub started_at: Instant,
}

impl Data {
    /// Creates the shared data with empty rate limiters.
    pub fn new(config: Arc<Config>, cache: Arc<PersistentCache>) -> Self {
        Self {
            config,
            cache,
            command_limiter: RateLimiter::new(),
            round_trip_limiter: RateLimiter::new(),
            started_at: Instant::now(),
        }
    }

    /// Bucket applied to every command per user.
    pub fn command_bucket(&self) -> BucketConfig {
        let limits = &self.config.rate_limiting;
        BucketConfig::new(limits.command_capacity, limits.command_window())
    }

    /// Bucket applied to round-trip pings per channel.
    pub fn round_trip_bucket(&self) -> BucketConfig {
        let limits = &self.config.rate_limiting;
        BucketConfig::new(limits.round_trip_capacity, limits.round_trip_window())
    }
}

impl std::fmt::Debug for Data {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Data")
            .field("config", &"<Config>")
            .field("cache", &self.cache)
            .field("command_limiter", &self.command_limiter.len())
            .field("round_trip_limiter", &self.round_trip_limiter.len())
            .field("started_at", &self.started_at)
            .finish()
    }
}

/// Command context type.
pub type Context<'a> = poise::Context<'a, Data, CommandError>;

/// Every command the bot serves.
pub fn commands() -> Vec<poise::Command<Data, CommandError>> {
    vec![
        crate::help::help(),
        crate::ping::ping(),
        crate::prefix::prefix(),
        crate::socketstats::socketstats(),
        crate::stats::stats(),
        crate::todo::todo(),
        crate::uptime::uptime(),
    ]
}

/// Framework options with every dispatch hook wired in. The event handler is
/// left to the caller.
pub fn framework_options(config: &Config) -> poise::FrameworkOptions<Data, CommandError> {
    poise::FrameworkOptions {
        commands: commands(),
        on_error: |error| Box::pin(on_error(error)),
        pre_command: |ctx| Box::pin(pre_command(ctx)),
        command_check: Some(|ctx| Box::pin(command_check(ctx))),
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: None,
            stripped_dynamic_prefix: Some(|ctx, msg, data| Box::pin(resolve_prefix(ctx, msg, data))),
            mention_as_prefix: true,
            case_insensitive_commands: true,
            ..Default::default()
        },
        owners: config
            .discord
            .owners
            .iter()
            .filter(|id| **id != 0)
            .map(|id| serenity::UserId::new(*id))
            .collect(),
        skip_checks_for_owners: true,
        ..Default::default()
    }
}
