//! Write-back cache over a [`Store`].
//!
//! Every read and edit is served from memory. [`PersistentCache::dump_all`]
//! writes changed tables back and is driven by the scheduler; a crash loses at
//! most the edits made since the last successful flush.
//!
//! Each table family has its own lock. Locks are released before any store
//! call, so no guard is ever held across an `.await`. Prefix rows are the
//! exception on the store side: writes and deletes of them are serialized so
//! a flush that copied a guild's prefixes cannot write them back after the
//! guild was forgotten.

use crate::prefixes::{GuildPrefixes, PrefixError};
use crate::stats::{Counter, DailyStatsRecord, StatsTable, UsageStats};
use crate::store::{Store, StoreResult};
use crate::todos::{TodoError, TodoLists};
use chrono::{Local, NaiveDate};
use parking_lot::{Mutex, RwLock};
use pbbot_common::{GuildId, UserId};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// In-memory prefixes, todo lists and usage counters backed by a store.
pub struct PersistentCache {
    store: Arc<dyn Store>,
    prefixes: RwLock<GuildPrefixes>,
    todos: RwLock<TodoLists>,
    stats: Mutex<UsageStats>,
    events: Mutex<Counter>,
    prefix_writes: tokio::sync::Mutex<()>,
}

impl PersistentCache {
    /// An empty cache over `store`. Call [`Self::load_all`] before serving.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            prefixes: RwLock::new(GuildPrefixes::default()),
            todos: RwLock::new(TodoLists::default()),
            stats: Mutex::new(UsageStats::new(Local::now().date_naive())),
            events: Mutex::new(Counter::default()),
            prefix_writes: tokio::sync::Mutex::new(()),
        }
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Loads every table, treating the local date as today.
    pub async fn load_all(&self) -> StoreResult<()> {
        self.load_all_on(Local::now().date_naive()).await
    }

    /// Loads every table, treating `today` as the current day.
    pub async fn load_all_on(&self, today: NaiveDate) -> StoreResult<()> {
        let prefixes = self.store.load_prefixes().await?;
        let todos = self.store.load_todos().await?;
        let records = self.store.load_daily_stats().await?;

        info!(
            "Loaded {} guild prefix sets, {} todo lists and {} daily stats records",
            prefixes.len(),
            todos.len(),
            records.len()
        );

        *self.prefixes.write() = GuildPrefixes::from_rows(prefixes);
        *self.todos.write() = TodoLists::from_rows(todos);
        *self.stats.lock() = UsageStats::from_records(&records, today);
        Ok(())
    }

    /// Writes changed prefixes and todo lists, any pending daily records, and
    /// today's counters under their own date. Stops at the first failure; the
    /// unwritten state stays marked for the next call.
    pub async fn dump_all(&self) -> StoreResult<()> {
        self.dump_prefixes().await?;

        let todos = self.todos.write().take_dirty();
        if let Some(rows) = todos {
            for (user, tasks) in &rows {
                if let Err(e) = self.store.save_todos(*user, tasks).await {
                    self.todos.write().mark_dirty();
                    return Err(e);
                }
            }
            debug!("Flushed {} todo lists", rows.len());
        }

        let (pending, today) = {
            let mut stats = self.stats.lock();
            (stats.take_pending(), stats.today_record())
        };

        for (i, record) in pending.iter().enumerate() {
            if let Err(e) = self.store.save_daily_stats(record).await {
                let mut stats = self.stats.lock();
                for unwritten in &pending[i..] {
                    stats.push_pending(unwritten.clone());
                }
                return Err(e);
            }
            info!("Wrote pending stats record for {}", record.date);
        }

        self.store.save_daily_stats(&today).await
    }

    async fn dump_prefixes(&self) -> StoreResult<()> {
        let _writing = self.prefix_writes.lock().await;
        let taken = self.prefixes.write().take_dirty();
        let Some(rows) = taken else {
            return Ok(());
        };

        for (guild, list) in &rows {
            if let Err(e) = self.store.save_prefixes(*guild, list).await {
                self.prefixes.write().mark_dirty();
                return Err(e);
            }
        }
        debug!("Flushed {} guild prefix sets", rows.len());
        Ok(())
    }

    /// Effective prefixes for `guild`, `None` meaning direct messages.
    pub fn prefixes(&self, guild: Option<GuildId>) -> Vec<String> {
        match guild {
            Some(guild) => self.prefixes.read().effective(guild),
            None => vec![crate::prefixes::DEFAULT_PREFIX.to_string()],
        }
    }

    /// The guild's custom prefix list, if it has one.
    pub fn custom_prefixes(&self, guild: GuildId) -> Option<Vec<String>> {
        self.prefixes.read().custom(guild).map(<[String]>::to_vec)
    }

    /// Adds a custom prefix for `guild`.
    pub fn add_prefix(&self, guild: GuildId, prefix: &str) -> Result<(), PrefixError> {
        self.prefixes.write().add(guild, prefix)
    }

    /// Removes a custom prefix from `guild`.
    pub fn remove_prefix(&self, guild: GuildId, prefix: &str) -> Result<(), PrefixError> {
        self.prefixes.write().remove(guild, prefix)
    }

    /// Clears every custom prefix of `guild`.
    pub fn clear_prefixes(&self, guild: GuildId) -> Result<(), PrefixError> {
        self.prefixes.write().clear(guild)
    }

    /// Drops everything held for a guild the bot has left. Waits for any
    /// prefix write in flight so the deleted row stays deleted.
    pub async fn forget_guild(&self, guild: GuildId) -> StoreResult<()> {
        let _writing = self.prefix_writes.lock().await;
        if self.prefixes.write().forget(guild) {
            debug!("Dropped cached prefixes for guild {}", guild);
        }
        self.store.delete_prefixes(guild).await
    }

    /// The user's todo list.
    pub fn todos(&self, user: UserId) -> Vec<String> {
        self.todos.read().get(user)
    }

    /// Appends a task and returns its 1-based position.
    pub fn add_todo(&self, user: UserId, task: &str) -> Result<usize, TodoError> {
        self.todos.write().add(user, task)
    }

    /// Removes the task at a 1-based `index`.
    pub fn remove_todo(&self, user: UserId, index: usize) -> Result<String, TodoError> {
        self.todos.write().remove(user, index)
    }

    /// Empties the user's todo list.
    pub fn clear_todos(&self, user: UserId) -> Result<usize, TodoError> {
        self.todos.write().clear(user)
    }

    /// Counts one command invocation.
    pub fn record_usage(&self, command: &str, user: UserId) {
        self.stats.lock().record(command, user);
    }

    /// Up to `k` entries of `table`, highest count first.
    pub fn top(&self, table: StatsTable, k: usize) -> Vec<(String, u64)> {
        self.stats.lock().top(table, k)
    }

    /// Counts one gateway event by name. Kept in memory only.
    pub fn record_event(&self, name: &str) {
        self.events.lock().add(name, 1);
    }

    /// Up to `k` gateway events, most frequent first.
    pub fn top_events(&self, k: usize) -> Vec<(String, u64)> {
        self.events.lock().most_common(k)
    }

    /// Gateway events seen since start.
    pub fn total_events(&self) -> u64 {
        self.events.lock().total()
    }

    /// Day the today counters belong to.
    pub fn stats_day(&self) -> NaiveDate {
        self.stats.lock().day()
    }

    /// Closes the day: takes the today counters, re-dates them to `new_day`
    /// and writes them as the record of the day they were collected on.
    ///
    /// Returns `Ok(false)` if `new_day` is not after the counters' day. On a
    /// failed write the record is kept and retried by the next flush.
    ///
    /// Must not run while a flush is in flight; [`crate::Scheduler`] ensures
    /// this.
    pub async fn rollover(&self, new_day: NaiveDate) -> StoreResult<bool> {
        let taken = self.stats.lock().take_today(new_day);
        let Some(record) = taken else {
            debug!("Stats already collecting for {}, skipping rollover", new_day);
            return Ok(false);
        };

        self.write_closed_day(record).await?;
        Ok(true)
    }

    async fn write_closed_day(&self, record: DailyStatsRecord) -> StoreResult<()> {
        match self.store.save_daily_stats(&record).await {
            Ok(()) => {
                info!(
                    "Rolled over stats for {} ({} command uses)",
                    record.date,
                    record.total_uses()
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    "Failed to write stats for {}, keeping it for the next flush: {}",
                    record.date, e
                );
                self.stats.lock().push_pending(record);
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for PersistentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentCache")
            .field("guilds", &self.prefixes.read().len())
            .field("stats_day", &self.stats.lock().day())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use pbbot_common::test_utils::discord_fixtures::{test_guild_id, test_user_id};
    use pbbot_common::test_utils::mock_date;
    use std::time::Duration;
    use tokio_test::assert_err;

    fn cache_with_store() -> (Arc<MemoryStore>, PersistentCache) {
        let store = Arc::new(MemoryStore::new());
        let cache = PersistentCache::new(store.clone());
        (store, cache)
    }

    #[tokio::test]
    async fn test_round_trip_through_store() {
        let (store, cache) = cache_with_store();
        let day = mock_date(2024, 5, 1);
        cache.load_all_on(day).await.unwrap();

        cache.add_prefix(test_guild_id(), "!").unwrap();
        cache.add_todo(test_user_id(), "buy milk").unwrap();
        cache.record_usage("ping", test_user_id());
        cache.dump_all().await.unwrap();

        let restarted = PersistentCache::new(store);
        restarted.load_all_on(day).await.unwrap();
        assert_eq!(restarted.prefixes(Some(test_guild_id())), vec!["!"]);
        assert_eq!(restarted.todos(test_user_id()), vec!["buy milk"]);
        assert_eq!(
            restarted.top(StatsTable::CommandsToday, 5),
            vec![("ping".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_failed_dump_keeps_memory_and_retries() {
        let (store, cache) = cache_with_store();
        cache.add_prefix(test_guild_id(), "!").unwrap();

        store.set_failing(true);
        assert_err!(cache.dump_all().await);
        assert_eq!(cache.prefixes(Some(test_guild_id())), vec!["!"]);
        assert!(store.prefix_row(test_guild_id()).is_none());

        store.set_failing(false);
        cache.dump_all().await.unwrap();
        assert_eq!(store.prefix_row(test_guild_id()), Some(vec!["!".to_string()]));
    }

    #[tokio::test]
    async fn test_rollover_writes_under_collection_date() {
        let (store, cache) = cache_with_store();
        let day = mock_date(2024, 5, 1);
        let next = mock_date(2024, 5, 2);
        cache.load_all_on(day).await.unwrap();

        for _ in 0..5 {
            cache.record_usage("ping", test_user_id());
        }
        assert!(cache.rollover(next).await.unwrap());

        let record = store.daily_record(day).unwrap();
        assert_eq!(record.commands.get("ping"), Some(&5));
        assert!(cache.top(StatsTable::CommandsToday, 5).is_empty());
        assert_eq!(cache.top(StatsTable::CommandsOverall, 1), vec![("ping".to_string(), 5)]);
        assert_eq!(cache.stats_day(), next);

        assert!(!cache.rollover(next).await.unwrap());
    }

    #[tokio::test]
    async fn test_failed_rollover_is_written_by_next_flush() {
        let (store, cache) = cache_with_store();
        let day = mock_date(2024, 5, 1);
        cache.load_all_on(day).await.unwrap();
        cache.record_usage("ping", test_user_id());
        cache.dump_all().await.unwrap();
        cache.record_usage("ping", test_user_id());

        store.set_failing(true);
        assert_err!(cache.rollover(mock_date(2024, 5, 2)).await);
        store.set_failing(false);

        assert_eq!(store.daily_record(day).unwrap().commands.get("ping"), Some(&1));
        cache.dump_all().await.unwrap();
        assert_eq!(store.daily_record(day).unwrap().commands.get("ping"), Some(&2));
    }

    #[tokio::test]
    async fn test_forget_guild_removes_row_and_memory() {
        let (store, cache) = cache_with_store();
        cache.add_prefix(test_guild_id(), "!").unwrap();
        cache.dump_all().await.unwrap();

        cache.forget_guild(test_guild_id()).await.unwrap();
        assert!(store.prefix_row(test_guild_id()).is_none());
        assert!(cache.custom_prefixes(test_guild_id()).is_none());
        assert_eq!(cache.prefixes(Some(test_guild_id())), vec!["pb"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_guild_leave_during_flush_stays_deleted() {
        let store = Arc::new(MemoryStore::new());
        let cache = Arc::new(PersistentCache::new(store.clone()));
        cache.add_prefix(test_guild_id(), "!").unwrap();
        store.set_write_delay(Some(Duration::from_secs(5)));

        let flushing = tokio::spawn({
            let cache = cache.clone();
            async move { cache.dump_all().await }
        });
        tokio::time::sleep(Duration::from_secs(1)).await;

        cache.forget_guild(test_guild_id()).await.unwrap();
        flushing.await.unwrap().unwrap();

        assert!(store.prefix_row(test_guild_id()).is_none());
        let restarted = PersistentCache::new(store);
        restarted.load_all().await.unwrap();
        assert!(restarted.custom_prefixes(test_guild_id()).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_partially_failed_pending_flush_is_retried() {
        let (store, cache) = cache_with_store();
        let first = mock_date(2024, 5, 1);
        let second = mock_date(2024, 5, 2);
        let third = mock_date(2024, 5, 3);
        cache.load_all_on(first).await.unwrap();

        store.set_failing(true);
        cache.record_usage("ping", test_user_id());
        assert_err!(cache.rollover(second).await);
        cache.record_usage("todo", test_user_id());
        assert_err!(cache.rollover(third).await);
        store.set_failing(false);

        store.set_failing_date(second, true);
        assert_err!(cache.dump_all().await);
        assert_eq!(store.daily_record(first).unwrap().commands.get("ping"), Some(&1));
        assert!(store.daily_record(second).is_none());
        assert_eq!(store.stats_writes(), 1);

        store.set_failing_date(second, false);
        cache.dump_all().await.unwrap();
        assert_eq!(store.daily_record(first).unwrap().commands.get("ping"), Some(&1));
        assert_eq!(store.daily_record(second).unwrap().commands.get("todo"), Some(&1));
        assert!(store.daily_record(third).is_some());
        assert_eq!(store.stats_writes(), 3);
    }

    #[tokio::test]
    async fn test_event_tally() {
        let (_store, cache) = cache_with_store();
        for name in ["message", "ready", "message"] {
            cache.record_event(name);
        }
        assert_eq!(cache.total_events(), 3);
        assert_eq!(
            cache.top_events(5),
            vec![("message".to_string(), 2), ("ready".to_string(), 1)]
        );
    }

    #[tokio::test]
    async fn test_direct_messages_use_default_prefix() {
        let (_store, cache) = cache_with_store();
        assert_eq!(cache.prefixes(None), vec!["pb"]);
    }

    #[tokio::test]
    async fn test_load_failure_is_reported() {
        let (store, cache) = cache_with_store();
        store.set_failing(true);
        assert_err!(cache.load_all().await);
    }
}
