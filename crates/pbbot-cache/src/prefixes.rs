//! Per-guild command prefixes.

use pbbot_common::GuildId;
use std::collections::HashMap;
use thiserror::Error;

/// Prefix used in direct messages and by guilds without custom prefixes.
pub const DEFAULT_PREFIX: &str = "pb";

/// Longest accepted prefix, in characters.
pub const PREFIX_LENGTH_LIMIT: usize = 10;

/// Most prefixes a single guild may hold.
pub const TOTAL_PREFIX_LIMIT: usize = 50;

/// Rejections of a prefix edit. None of these touch the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrefixError {
    /// The prefix was empty or whitespace.
    #[error("A prefix can't be empty.")]
    Empty,

    /// The prefix is longer than [`PREFIX_LENGTH_LIMIT`].
    #[error("Sorry, that prefix is too long (>{PREFIX_LENGTH_LIMIT} characters).")]
    TooLong,

    /// The guild already has this prefix.
    #[error("`{0}` is already a prefix for this server.")]
    Duplicate(String),

    /// The guild already holds [`TOTAL_PREFIX_LIMIT`] prefixes.
    #[error("This server already has {TOTAL_PREFIX_LIMIT} prefixes.")]
    LimitReached,

    /// The guild has no custom prefixes to clear or remove.
    #[error("This server doesn't have any custom prefixes.")]
    NoCustomPrefixes,

    /// The prefix to remove is not in the guild's list.
    #[error("Couldn't find `{0}` in the list of prefixes for this server.")]
    NotFound(String),
}

/// In-memory prefix table.
#[derive(Debug, Default, Clone)]
pub struct GuildPrefixes {
    guilds: HashMap<GuildId, Vec<String>>,
    dirty: bool,
}

impl GuildPrefixes {
    /// Builds the table from stored rows.
    pub fn from_rows(rows: impl IntoIterator<Item = (GuildId, Vec<String>)>) -> Self {
        Self {
            guilds: rows.into_iter().collect(),
            dirty: false,
        }
    }

    /// Prefixes the guild answers to, falling back to [`DEFAULT_PREFIX`].
    pub fn effective(&self, guild: GuildId) -> Vec<String> {
        match self.guilds.get(&guild) {
            Some(list) if !list.is_empty() => list.clone(),
            _ => vec![DEFAULT_PREFIX.to_string()],
        }
    }

    /// The guild's stored list, if it has one.
    pub fn custom(&self, guild: GuildId) -> Option<&[String]> {
        self.guilds.get(&guild).map(Vec::as_slice)
    }

    /// Appends a prefix, creating the guild's record on first use.
    pub fn add(&mut self, guild: GuildId, prefix: &str) -> Result<(), PrefixError> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(PrefixError::Empty);
        }
        if prefix.chars().count() > PREFIX_LENGTH_LIMIT {
            return Err(PrefixError::TooLong);
        }

        let list = self.guilds.entry(guild).or_default();
        if list.iter().any(|existing| existing == prefix) {
            return Err(PrefixError::Duplicate(prefix.to_string()));
        }
        if list.len() >= TOTAL_PREFIX_LIMIT {
            return Err(PrefixError::LimitReached);
        }

        list.push(prefix.to_string());
        self.dirty = true;
        Ok(())
    }

    /// Removes one prefix from the guild's list.
    pub fn remove(&mut self, guild: GuildId, prefix: &str) -> Result<(), PrefixError> {
        let prefix = prefix.trim();
        if prefix.chars().count() > PREFIX_LENGTH_LIMIT {
            return Err(PrefixError::TooLong);
        }
        let list = match self.guilds.get_mut(&guild) {
            Some(list) if !list.is_empty() => list,
            _ => return Err(PrefixError::NoCustomPrefixes),
        };

        let position = list
            .iter()
            .position(|existing| existing == prefix)
            .ok_or_else(|| PrefixError::NotFound(prefix.to_string()))?;
        list.remove(position);
        self.dirty = true;
        Ok(())
    }

    /// Empties the guild's list. The record stays so the next flush writes it.
    pub fn clear(&mut self, guild: GuildId) -> Result<(), PrefixError> {
        match self.guilds.get_mut(&guild) {
            Some(list) if !list.is_empty() => {
                list.clear();
                self.dirty = true;
                Ok(())
            }
            _ => Err(PrefixError::NoCustomPrefixes),
        }
    }

    /// Drops the guild's record entirely. Returns whether one existed.
    pub fn forget(&mut self, guild: GuildId) -> bool {
        self.guilds.remove(&guild).is_some()
    }

    /// Copies every record for writing to the store.
    pub fn snapshot(&self) -> Vec<(GuildId, Vec<String>)> {
        self.guilds
            .iter()
            .map(|(guild, list)| (*guild, list.clone()))
            .collect()
    }

    /// Whether the table changed since its last snapshot for writing.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Snapshots the table and marks it clean, if it changed.
    pub fn take_dirty(&mut self) -> Option<Vec<(GuildId, Vec<String>)>> {
        if !self.dirty {
            return None;
        }
        self.dirty = false;
        Some(self.snapshot())
    }

    /// Marks the table as changed, e.g. after a failed write.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Number of guilds with a record.
    pub fn len(&self) -> usize {
        self.guilds.len()
    }

    /// Whether no guild has a record.
    pub fn is_empty(&self) -> bool {
        self.guilds.is_empty()
    }
}

/// Matches `content` against `prefixes` in order, ignoring case, and returns
/// the byte offset where the command starts (after any whitespace).
pub fn match_prefix<S: AsRef<str>>(content: &str, prefixes: &[S]) -> Option<usize> {
    prefixes.iter().find_map(|prefix| {
        let end = strip_prefix_ignore_case(content, prefix.as_ref())?;
        let rest = &content[end..];
        Some(end + (rest.len() - rest.trim_start().len()))
    })
}

fn strip_prefix_ignore_case(content: &str, prefix: &str) -> Option<usize> {
    if prefix.is_empty() {
        return None;
    }

    let mut content_chars = content.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = content_chars.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }

    Some(content_chars.next().map_or(content.len(), |(index, _)| index))
}
