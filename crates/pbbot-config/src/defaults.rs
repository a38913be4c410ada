//! Default values matching the behaviour of the hosted bot.

use crate::schema::*;

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            owners: Vec::new(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://pbbot.db".to_string(),
            max_connections: 5,
        }
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            flush_interval_seconds: 10,
            presence_interval_minutes: 30,
        }
    }
}

impl Default for RateLimitingConfig {
    fn default() -> Self {
        Self {
            command_capacity: 5,
            command_window_seconds: 5,
            round_trip_capacity: 1,
            round_trip_window_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_rate_limit_defaults() {
        let limits = RateLimitingConfig::default();
        assert_eq!(limits.command_capacity, 5);
        assert_eq!(limits.command_window(), Duration::from_secs(5));
        assert_eq!(limits.round_trip_capacity, 1);
        assert_eq!(limits.round_trip_window(), Duration::from_secs(30));
    }

    #[test]
    fn test_scheduling_defaults() {
        let scheduling = SchedulingConfig::default();
        assert_eq!(scheduling.flush_interval(), Duration::from_secs(10));
        assert_eq!(scheduling.presence_interval(), Duration::from_secs(30 * 60));
    }

    #[test]
    fn test_huge_presence_interval_saturates() {
        let scheduling = SchedulingConfig {
            presence_interval_minutes: u64::MAX,
            ..SchedulingConfig::default()
        };
        assert_eq!(scheduling.presence_interval(), Duration::from_secs(u64::MAX));
    }
}
