//! Runtime validation of a loaded configuration.

use crate::loader::ConfigError;
use crate::schema::Config;

impl Config {
    /// Validates the configuration, returning every problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let problems = ConfigValidator::problems(self);
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(problems.join("; ")))
        }
    }
}

/// Longest accepted presence interval, one week.
pub const MAX_PRESENCE_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Lists validation problems, empty when the configuration is usable.
    pub fn problems(config: &Config) -> Vec<String> {
        let mut problems = Vec::new();

        if config.discord.token.trim().is_empty() {
            problems.push("Discord token cannot be empty".to_string());
        }
        if config.database.url.trim().is_empty() {
            problems.push("database url cannot be empty".to_string());
        }
        if config.database.max_connections == 0 {
            problems.push("database max_connections must be at least 1".to_string());
        }
        if config.scheduling.flush_interval_seconds == 0 {
            problems.push("flush_interval_seconds must be at least 1".to_string());
        }
        if config.scheduling.presence_interval_minutes == 0 {
            problems.push("presence_interval_minutes must be at least 1".to_string());
        }
        if config.scheduling.presence_interval_minutes > MAX_PRESENCE_INTERVAL_MINUTES {
            problems.push(format!(
                "presence_interval_minutes must be at most {MAX_PRESENCE_INTERVAL_MINUTES}"
            ));
        }

        let limits = &config.rate_limiting;
        if limits.command_capacity == 0 || limits.command_window_seconds == 0 {
            problems.push("command rate limit needs a non-zero capacity and window".to_string());
        }
        if limits.round_trip_capacity == 0 || limits.round_trip_window_seconds == 0 {
            problems.push("round-trip rate limit needs a non-zero capacity and window".to_string());
        }

        problems
    }
}
