//! Command usage counters.
//!
//! Usage is counted per qualified command name and per invoking user, in a
//! "today" window and an "overall" window. The today counters carry the date
//! they were collected on so that every persisted [`DailyStatsRecord`] is
//! written under the right day, whenever the write happens.
//!
//! Overall totals are never persisted on their own: at startup they are
//! rebuilt as the sum of every stored daily record.

use chrono::NaiveDate;
use pbbot_common::UserId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One day's command and user counts as stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStatsRecord {
    /// Day the counts were collected on.
    pub date: NaiveDate,
    /// Qualified command name to uses.
    pub commands: BTreeMap<String, u64>,
    /// User id (decimal) to commands invoked.
    pub users: BTreeMap<String, u64>,
}

impl DailyStatsRecord {
    /// An empty record for `date`.
    pub const fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            commands: BTreeMap::new(),
            users: BTreeMap::new(),
        }
    }

    /// Total command uses in the record.
    pub fn total_uses(&self) -> u64 {
        self.commands.values().sum()
    }
}

/// The four counter tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatsTable {
    /// Commands used today.
    CommandsToday,
    /// Commands used since the first record.
    CommandsOverall,
    /// Users who used commands today.
    UsersToday,
    /// Users who used commands since the first record.
    UsersOverall,
}

impl StatsTable {
    /// Every table, in display order.
    pub const ALL: [Self; 4] = [
        Self::CommandsToday,
        Self::CommandsOverall,
        Self::UsersToday,
        Self::UsersOverall,
    ];

    /// The table's name as accepted by [`FromStr`].
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CommandsToday => "top_commands_today",
            Self::CommandsOverall => "top_commands_overall",
            Self::UsersToday => "top_users_today",
            Self::UsersOverall => "top_users_overall",
        }
    }

    /// Whether the table counts users rather than commands.
    pub const fn is_users(self) -> bool {
        matches!(self, Self::UsersToday | Self::UsersOverall)
    }
}

impl fmt::Display for StatsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An unknown table name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown stats table `{0}`")]
pub struct UnknownStatsTable(pub String);

impl FromStr for StatsTable {
    type Err = UnknownStatsTable;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|table| table.as_str() == s)
            .ok_or_else(|| UnknownStatsTable(s.to_string()))
    }
}

/// Counts keyed by identity, remembering first-insertion order so ties rank
/// stably.
#[derive(Debug, Default, Clone)]
pub struct Counter {
    entries: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl Counter {
    /// Adds `by` to `key`.
    pub fn add(&mut self, key: &str, by: u64) {
        if let Some(&slot) = self.index.get(key) {
            self.entries[slot].1 += by;
        } else {
            self.index.insert(key.to_string(), self.entries.len());
            self.entries.push((key.to_string(), by));
        }
    }

    /// Count for `key`, zero if unseen.
    pub fn get(&self, key: &str) -> u64 {
        self.index.get(key).map_or(0, |&slot| self.entries[slot].1)
    }

    /// Up to `k` entries, highest count first.
    pub fn most_common(&self, k: usize) -> Vec<(String, u64)> {
        let mut ranked = self.entries.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(k);
        ranked
    }

    /// Sum of every count.
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, count)| count).sum()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been counted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn to_map(&self) -> BTreeMap<String, u64> {
        self.entries.iter().cloned().collect()
    }

    fn merge(&mut self, counts: &BTreeMap<String, u64>) {
        for (key, count) in counts {
            self.add(key, *count);
        }
    }
}

/// Usage counters for the running process.
#[derive(Debug, Clone)]
pub struct UsageStats {
    day: NaiveDate,
    commands_today: Counter,
    users_today: Counter,
    commands_overall: Counter,
    users_overall: Counter,
    pending: Vec<DailyStatsRecord>,
}

impl UsageStats {
    /// Empty counters collecting for `day`.
    pub fn new(day: NaiveDate) -> Self {
        Self {
            day,
            commands_today: Counter::default(),
            users_today: Counter::default(),
            commands_overall: Counter::default(),
            users_overall: Counter::default(),
            pending: Vec::new(),
        }
    }

    /// Rebuilds counters from stored records: overall is the sum of all of
    /// them, today is the record for `today` if one exists.
    pub fn from_records(records: &[DailyStatsRecord], today: NaiveDate) -> Self {
        let mut stats = Self::new(today);
        for record in records {
            stats.commands_overall.merge(&record.commands);
            stats.users_overall.merge(&record.users);
            if record.date == today {
                stats.commands_today.merge(&record.commands);
                stats.users_today.merge(&record.users);
            }
        }
        stats
    }

    /// Counts one invocation of `command` by `user` in all four tables.
    pub fn record(&mut self, command: &str, user: UserId) {
        let user = user.to_string();
        self.commands_today.add(command, 1);
        self.commands_overall.add(command, 1);
        self.users_today.add(&user, 1);
        self.users_overall.add(&user, 1);
    }

    /// Up to `k` identities of `table`, highest count first.
    pub fn top(&self, table: StatsTable, k: usize) -> Vec<(String, u64)> {
        self.table(table).most_common(k)
    }

    /// Borrow one counter table.
    pub const fn table(&self, table: StatsTable) -> &Counter {
        match table {
            StatsTable::CommandsToday => &self.commands_today,
            StatsTable::CommandsOverall => &self.commands_overall,
            StatsTable::UsersToday => &self.users_today,
            StatsTable::UsersOverall => &self.users_overall,
        }
    }

    /// Day the today counters belong to.
    pub const fn day(&self) -> NaiveDate {
        self.day
    }

    /// Today's counts as a record under their own date.
    pub fn today_record(&self) -> DailyStatsRecord {
        DailyStatsRecord {
            date: self.day,
            commands: self.commands_today.to_map(),
            users: self.users_today.to_map(),
        }
    }

    /// Takes the today counters, leaving them empty and dated `new_day`.
    /// Returns `None` if `new_day` is not after the current day.
    pub fn take_today(&mut self, new_day: NaiveDate) -> Option<DailyStatsRecord> {
        if new_day <= self.day {
            return None;
        }

        let record = self.today_record();
        self.commands_today = Counter::default();
        self.users_today = Counter::default();
        self.day = new_day;
        Some(record)
    }

    /// Keeps a record whose write failed so a later flush retries it.
    pub fn push_pending(&mut self, record: DailyStatsRecord) {
        self.pending.retain(|existing| existing.date != record.date);
        self.pending.push(record);
    }

    /// Takes every pending record.
    pub fn take_pending(&mut self) -> Vec<DailyStatsRecord> {
        std::mem::take(&mut self.pending)
    }

    /// Records still waiting to be written.
    pub fn pending(&self) -> &[DailyStatsRecord] {
        &self.pending
    }
}
