//! Integration tests for pbbot-bot.
//!
//! These run the startup and shutdown path without a gateway connection:
//! configuration file -> SQLite store -> cache -> scheduler -> final flush.

use pbbot_bot::{is_bare_mention, open_cache, BotError};
use pbbot_cache::{Scheduler, SchedulerOptions, SchedulerState, StatsTable};
use pbbot_common::test_utils::discord_fixtures::{test_guild_id, test_user_id};
use pbbot_common::test_utils::init_test_logging;
use pbbot_config::{Config, ConfigLoader};
use std::path::Path;
use tempfile::TempDir;

fn write_config(dir: &Path) -> Config {
    let db = dir.join("pbbot.db");
    let content = format!(
        r#"
[discord]
token = "test-token"

[database]
url = "sqlite://{}"
max_connections = 2

[scheduling]
flush_interval_seconds = 60
presence_interval_minutes = 5
"#,
        db.display()
    );
    let path = dir.join("config.toml");
    std::fs::write(&path, content).unwrap();

    let config = ConfigLoader::load_file(&path).unwrap();
    config.validate().unwrap();
    config
}

#[tokio::test]
async fn test_shutdown_persists_cache() {
    init_test_logging();
    let dir = TempDir::new().unwrap();
    let config = write_config(dir.path());

    {
        let (store, cache) = open_cache(&config).await.unwrap();
        let scheduler = Scheduler::start(
            cache.clone(),
            SchedulerOptions::from(&config.scheduling),
            None,
        );

        cache.add_prefix(test_guild_id(), "?").unwrap();
        cache.add_todo(test_user_id(), "ship it").unwrap();
        cache.record_usage("ping", test_user_id());

        scheduler.shutdown().await.unwrap();
        assert_eq!(scheduler.state(), SchedulerState::Stopped);
        store.close().await;
    }

    let (store, cache) = open_cache(&config).await.unwrap();
    assert_eq!(cache.prefixes(Some(test_guild_id())), vec!["?"]);
    assert_eq!(cache.todos(test_user_id()), vec!["ship it"]);
    assert_eq!(
        cache.top(StatsTable::CommandsOverall, 5),
        vec![("ping".to_string(), 1)]
    );
    store.close().await;
}

#[tokio::test]
async fn test_unreachable_store_is_fatal() {
    let mut config = Config::default();
    config.discord.token = "test-token".to_string();
    config.database.url = "sqlite:///nonexistent-dir/deeper/pbbot.db".to_string();

    let err = open_cache(&config).await.unwrap_err();
    assert!(matches!(err, BotError::Store(_)));
}

#[test]
fn test_mention_detection_uses_bot_id() {
    assert!(is_bare_mention("<@1234>", 1234));
    assert!(!is_bare_mention("<@1234> prefix", 1234));
}
