//! Configuration schema definitions using serde.

use pbbot_common::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure for PB Bot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Discord configuration.
    pub discord: DiscordConfig,
    /// Relational store configuration.
    pub database: DatabaseConfig,
    /// Background task configuration.
    pub scheduling: SchedulingConfig,
    /// Rate limiting configuration.
    pub rate_limiting: RateLimitingConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Discord bot configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    /// Discord bot token.
    pub token: String,
    /// User IDs allowed to bypass command checks.
    pub owners: Vec<u64>,
}

/// Relational store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite connection URL, e.g. `sqlite://pbbot.db`.
    pub url: String,
    /// Maximum pooled connections.
    pub max_connections: u32,
}

/// Background task configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Seconds between cache flushes.
    pub flush_interval_seconds: u64,
    /// Minutes between presence refreshes.
    pub presence_interval_minutes: u64,
}

impl SchedulingConfig {
    /// Interval between cache flushes.
    pub const fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_seconds)
    }

    /// Interval between presence refreshes.
    pub const fn presence_interval(&self) -> Duration {
        Duration::from_secs(self.presence_interval_minutes.saturating_mul(60))
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitingConfig {
    /// Commands a user may run per window.
    pub command_capacity: u32,
    /// Length of the per-user command window in seconds.
    pub command_window_seconds: u64,
    /// Round-trip pings a channel may request per window.
    pub round_trip_capacity: u32,
    /// Length of the per-channel round-trip window in seconds.
    pub round_trip_window_seconds: u64,
}

impl RateLimitingConfig {
    /// Per-user command window.
    pub const fn command_window(&self) -> Duration {
        Duration::from_secs(self.command_window_seconds)
    }

    /// Per-channel round-trip window.
    pub const fn round_trip_window(&self) -> Duration {
        Duration::from_secs(self.round_trip_window_seconds)
    }
}
