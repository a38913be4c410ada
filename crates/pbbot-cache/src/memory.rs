//! Map-backed [`Store`] for tests, with failure injection and an optional
//! write delay.

use crate::stats::DailyStatsRecord;
use crate::store::{Store, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use pbbot_common::{GuildId, UserId};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
struct Tables {
    prefixes: HashMap<GuildId, Vec<String>>,
    todos: HashMap<UserId, Vec<String>>,
    stats: BTreeMap<NaiveDate, DailyStatsRecord>,
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    failing: AtomicBool,
    write_delay: Mutex<Option<Duration>>,
    failing_dates: Mutex<HashSet<NaiveDate>>,
    stats_writes: AtomicUsize,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with [`StoreError::Unavailable`] while set.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Makes daily record writes for `date` fail while set.
    pub fn set_failing_date(&self, date: NaiveDate, failing: bool) {
        let mut dates = self.failing_dates.lock();
        if failing {
            dates.insert(date);
        } else {
            dates.remove(&date);
        }
    }

    /// Sleeps for `delay` before each write lands.
    pub fn set_write_delay(&self, delay: Option<Duration>) {
        *self.write_delay.lock() = delay;
    }

    /// The stored record for `date`.
    pub fn daily_record(&self, date: NaiveDate) -> Option<DailyStatsRecord> {
        self.tables.lock().stats.get(&date).cloned()
    }

    /// Prefix row for `guild`.
    pub fn prefix_row(&self, guild: GuildId) -> Option<Vec<String>> {
        self.tables.lock().prefixes.get(&guild).cloned()
    }

    /// Number of successful daily record writes.
    pub fn stats_writes(&self) -> usize {
        self.stats_writes.load(Ordering::SeqCst)
    }

    fn check(&self) -> StoreResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store set to fail".to_string()))
        } else {
            Ok(())
        }
    }

    async fn before_write(&self) -> StoreResult<()> {
        self.check()?;
        let delay = *self.write_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.check()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn load_prefixes(&self) -> StoreResult<Vec<(GuildId, Vec<String>)>> {
        self.check()?;
        Ok(self
            .tables
            .lock()
            .prefixes
            .iter()
            .map(|(guild, list)| (*guild, list.clone()))
            .collect())
    }

    async fn save_prefixes(&self, guild: GuildId, prefixes: &[String]) -> StoreResult<()> {
        self.before_write().await?;
        self.tables.lock().prefixes.insert(guild, prefixes.to_vec());
        Ok(())
    }

    async fn delete_prefixes(&self, guild: GuildId) -> StoreResult<()> {
        self.before_write().await?;
        self.tables.lock().prefixes.remove(&guild);
        Ok(())
    }

    async fn load_todos(&self) -> StoreResult<Vec<(UserId, Vec<String>)>> {
        self.check()?;
        Ok(self
            .tables
            .lock()
            .todos
            .iter()
            .map(|(user, list)| (*user, list.clone()))
            .collect())
    }

    async fn save_todos(&self, user: UserId, tasks: &[String]) -> StoreResult<()> {
        self.before_write().await?;
        self.tables.lock().todos.insert(user, tasks.to_vec());
        Ok(())
    }

    async fn load_daily_stats(&self) -> StoreResult<Vec<DailyStatsRecord>> {
        self.check()?;
        Ok(self.tables.lock().stats.values().cloned().collect())
    }

    async fn save_daily_stats(&self, record: &DailyStatsRecord) -> StoreResult<()> {
        self.before_write().await?;
        if self.failing_dates.lock().contains(&record.date) {
            return Err(StoreError::Unavailable(format!(
                "memory store set to fail writes for {}",
                record.date
            )));
        }
        self.tables.lock().stats.insert(record.date, record.clone());
        self.stats_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn ping(&self) -> StoreResult<Duration> {
        self.check()?;
        Ok(Duration::ZERO)
    }
}
