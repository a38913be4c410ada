//! Test utilities and shared test helpers for PB Bot.
//!
//! This module provides common testing utilities and fixtures that can be
//! used across all crates in the workspace for unit and integration testing.

use chrono::NaiveDate;
use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// This function is safe to call multiple times and will only initialize once.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// Test fixture for a calendar date.
pub fn mock_date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// Discord-related test utilities.
pub mod discord_fixtures {
    use crate::{ChannelId, GuildId, UserId};

    /// Create a test guild ID.
    pub fn test_guild_id() -> GuildId {
        GuildId(719_907_834_120_110_182)
    }

    /// Create a test channel ID.
    pub fn test_channel_id() -> ChannelId {
        ChannelId(123_456_789_012_345_678)
    }

    /// Create a test user ID.
    pub fn test_user_id() -> UserId {
        UserId(987_654_321_098_765_432)
    }

    /// Create multiple test user IDs.
    pub fn test_user_ids(count: usize) -> Vec<UserId> {
        (0..count)
            .map(|i| UserId(100_000_000_000_000_000 + i as u64))
            .collect()
    }
}

/// Configuration-related test utilities.
pub mod config_fixtures {
    /// A minimal valid configuration as YAML.
    pub fn minimal_config_yaml() -> &'static str {
        r#"
discord:
  token: "test_token"

database:
  url: "sqlite::memory:"
"#
    }

    /// A full configuration as TOML.
    pub fn full_config_toml() -> &'static str {
        r#"
[discord]
token = "test_token_full"
owners = [987654321098765432]

[database]
url = "sqlite://pbbot-test.db"
max_connections = 2

[scheduling]
flush_interval_seconds = 15
presence_interval_minutes = 10

[rate_limiting]
command_capacity = 3
command_window_seconds = 10
round_trip_capacity = 2
round_trip_window_seconds = 60

[logging]
level = "debug"
json_format = true
"#
    }
}

/// Property-based testing utilities using proptest.
pub mod property_testing {
    use crate::GuildId;
    use proptest::prelude::*;

    /// Strategy for generating valid Discord guild IDs.
    pub fn guild_id_strategy() -> impl Strategy<Value = GuildId> {
        (100_000_000_000_000_000u64..=999_999_999_999_999_999u64).prop_map(GuildId)
    }

    /// Strategy for prefix candidates, including some that are too long.
    pub fn prefix_strategy() -> impl Strategy<Value = String> {
        r"[a-z!?$.]{1,12}".prop_map(|s| s)
    }
}
