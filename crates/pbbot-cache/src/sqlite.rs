//! SQLite-backed [`Store`].
//!
//! List and counter columns hold JSON text. Every write is an
//! `INSERT ... ON CONFLICT DO UPDATE` on the row's key.

use crate::stats::DailyStatsRecord;
use crate::store::{Store, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use pbbot_common::{GuildId, UserId};
use pbbot_config::DatabaseConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite store over a connection pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connects to `config.url`, creating the database file if needed.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        info!("Connecting to database: {}", config.url);

        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// Opens a database file, creating it if needed.
    pub async fn open(path: &Path) -> StoreResult<Self> {
        info!("Opening database file: {}", path.display());

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// A private in-memory database. It lives as long as the store.
    pub async fn in_memory() -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> StoreResult<Self> {
        let store = Self { pool };
        store.initialize_schema().await?;
        Ok(store)
    }

    async fn initialize_schema(&self) -> StoreResult<()> {
        debug!("Initializing database schema");

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS prefixes (
                guild_id INTEGER PRIMARY KEY,
                guild_prefixes TEXT NOT NULL -- JSON array
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS todos (
                user_id INTEGER PRIMARY KEY,
                tasks TEXT NOT NULL -- JSON array
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS command_stats (
                date TEXT PRIMARY KEY,
                commands TEXT NOT NULL, -- JSON object
                users TEXT NOT NULL -- JSON object
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database connection closed");
    }
}

#[allow(clippy::cast_possible_wrap)]
const fn to_db_id(id: u64) -> i64 {
    id as i64
}

#[allow(clippy::cast_sign_loss)]
const fn from_db_id(id: i64) -> u64 {
    id as u64
}

#[async_trait]
impl Store for SqliteStore {
    async fn load_prefixes(&self) -> StoreResult<Vec<(GuildId, Vec<String>)>> {
        let rows: Vec<(i64, String)> =
            sqlx::query_as("SELECT guild_id, guild_prefixes FROM prefixes")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|(guild_id, json)| {
                Ok::<_, StoreError>((GuildId(from_db_id(guild_id)), serde_json::from_str(&json)?))
            })
            .collect()
    }

    async fn save_prefixes(&self, guild: GuildId, prefixes: &[String]) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO prefixes (guild_id, guild_prefixes) VALUES (?, ?)
            ON CONFLICT(guild_id) DO UPDATE SET guild_prefixes = excluded.guild_prefixes
            ",
        )
        .bind(to_db_id(guild.get()))
        .bind(serde_json::to_string(prefixes)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete_prefixes(&self, guild: GuildId) -> StoreResult<()> {
        sqlx::query("DELETE FROM prefixes WHERE guild_id = ?")
            .bind(to_db_id(guild.get()))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn load_todos(&self) -> StoreResult<Vec<(UserId, Vec<String>)>> {
        let rows: Vec<(i64, String)> = sqlx::query_as("SELECT user_id, tasks FROM todos")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|(user_id, json)| {
                Ok::<_, StoreError>((UserId(from_db_id(user_id)), serde_json::from_str(&json)?))
            })
            .collect()
    }

    async fn save_todos(&self, user: UserId, tasks: &[String]) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO todos (user_id, tasks) VALUES (?, ?)
            ON CONFLICT(user_id) DO UPDATE SET tasks = excluded.tasks
            ",
        )
        .bind(to_db_id(user.get()))
        .bind(serde_json::to_string(tasks)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn load_daily_stats(&self) -> StoreResult<Vec<DailyStatsRecord>> {
        let rows: Vec<(String, String, String)> =
            sqlx::query_as("SELECT date, commands, users FROM command_stats ORDER BY date")
                .fetch_all(&self.pool)
                .await?;

        rows.into_iter()
            .map(|(date, commands, users)| {
                let date = NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|e| {
                    StoreError::corrupt("command_stats", format!("bad date `{date}`: {e}"))
                })?;
                Ok::<_, StoreError>(DailyStatsRecord {
                    date,
                    commands: serde_json::from_str(&commands)?,
                    users: serde_json::from_str(&users)?,
                })
            })
            .collect()
    }

    async fn save_daily_stats(&self, record: &DailyStatsRecord) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO command_stats (date, commands, users) VALUES (?, ?, ?)
            ON CONFLICT(date) DO UPDATE SET commands = excluded.commands, users = excluded.users
            ",
        )
        .bind(record.date.format(DATE_FORMAT).to_string())
        .bind(serde_json::to_string(&record.commands)?)
        .bind(serde_json::to_string(&record.users)?)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn ping(&self) -> StoreResult<Duration> {
        let start = Instant::now();
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(start.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pbbot_common::test_utils::mock_date;

    #[tokio::test]
    async fn test_prefix_upsert_and_delete() {
        let store = SqliteStore::in_memory().await.unwrap();
        let guild = GuildId(719_907_834_120_110_182);

        store.save_prefixes(guild, &["!".to_string()]).await.unwrap();
        store
            .save_prefixes(guild, &["!".to_string(), "?".to_string()])
            .await
            .unwrap();
        assert_eq!(
            store.load_prefixes().await.unwrap(),
            vec![(guild, vec!["!".to_string(), "?".to_string()])]
        );

        store.delete_prefixes(guild).await.unwrap();
        assert!(store.load_prefixes().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_todos_round_trip() {
        let store = SqliteStore::in_memory().await.unwrap();
        let user = UserId(987_654_321_098_765_432);
        let tasks = vec!["first".to_string(), "second, with \"quotes\"".to_string()];

        store.save_todos(user, &tasks).await.unwrap();
        assert_eq!(store.load_todos().await.unwrap(), vec![(user, tasks)]);
    }

    #[tokio::test]
    async fn test_daily_stats_upsert_keeps_one_row_per_date() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut record = DailyStatsRecord::empty(mock_date(2024, 5, 1));
        record.commands.insert("ping".into(), 1);
        store.save_daily_stats(&record).await.unwrap();

        record.commands.insert("ping".into(), 3);
        store.save_daily_stats(&record).await.unwrap();

        let loaded = store.load_daily_stats().await.unwrap();
        assert_eq!(loaded, vec![record]);
    }

    #[tokio::test]
    async fn test_corrupt_date_is_reported() {
        let store = SqliteStore::in_memory().await.unwrap();
        sqlx::query("INSERT INTO command_stats (date, commands, users) VALUES ('yesterday', '{}', '{}')")
            .execute(&store.pool)
            .await
            .unwrap();

        assert!(matches!(
            store.load_daily_stats().await,
            Err(StoreError::Corrupt { table: "command_stats", .. })
        ));
    }

    #[tokio::test]
    async fn test_ping() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert!(store.ping().await.is_ok());
    }
}
