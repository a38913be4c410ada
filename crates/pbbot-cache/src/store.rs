//! Storage backend abstraction.

use crate::stats::DailyStatsRecord;
use async_trait::async_trait;
use pbbot_common::{GuildId, UserId};
use std::time::Duration;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database rejected or failed a query.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A JSON column could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored value is malformed.
    #[error("Corrupt {table} row: {message}")]
    Corrupt {
        /// Table holding the row.
        table: &'static str,
        /// What was wrong with it.
        message: String,
    },

    /// The store cannot be reached.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Create a corrupt-row error.
    pub fn corrupt(table: &'static str, message: impl Into<String>) -> Self {
        Self::Corrupt {
            table,
            message: message.into(),
        }
    }
}

/// Persistence for prefixes, todo lists and daily usage records. Writes are
/// upserts keyed by guild, user or date.
#[async_trait]
pub trait Store: Send + Sync {
    /// Every guild's stored prefix list.
    async fn load_prefixes(&self) -> StoreResult<Vec<(GuildId, Vec<String>)>>;

    /// Replaces one guild's prefix list.
    async fn save_prefixes(&self, guild: GuildId, prefixes: &[String]) -> StoreResult<()>;

    /// Deletes one guild's prefix row.
    async fn delete_prefixes(&self, guild: GuildId) -> StoreResult<()>;

    /// Every user's stored todo list.
    async fn load_todos(&self) -> StoreResult<Vec<(UserId, Vec<String>)>>;

    /// Replaces one user's todo list.
    async fn save_todos(&self, user: UserId, tasks: &[String]) -> StoreResult<()>;

    /// Every daily usage record.
    async fn load_daily_stats(&self) -> StoreResult<Vec<DailyStatsRecord>>;

    /// Replaces the record for `record.date`.
    async fn save_daily_stats(&self, record: &DailyStatsRecord) -> StoreResult<()>;

    /// Round-trip time of a trivial query.
    async fn ping(&self) -> StoreResult<Duration>;
}
