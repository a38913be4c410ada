//! Per-user todo lists.

use pbbot_common::UserId;
use std::collections::HashMap;
use thiserror::Error;

/// Longest accepted task, in characters.
pub const TODO_TASK_LENGTH_LIMIT: usize = 1000;

/// Rejections of a todo edit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TodoError {
    /// The task text was empty.
    #[error("You can't add an empty task.")]
    EmptyTask,

    /// The task is longer than [`TODO_TASK_LENGTH_LIMIT`].
    #[error("That task is too long (>{TODO_TASK_LENGTH_LIMIT} characters).")]
    TaskTooLong,

    /// The user's list is empty.
    #[error("Your todo list is empty.")]
    NoTasks,

    /// The 1-based index does not name a task.
    #[error("`{index}` is not a valid task number. Pick one between 1 and {len}.")]
    InvalidIndex {
        /// Index the user asked for.
        index: usize,
        /// Tasks currently in the list.
        len: usize,
    },
}

/// In-memory todo table.
#[derive(Debug, Default, Clone)]
pub struct TodoLists {
    users: HashMap<UserId, Vec<String>>,
    dirty: bool,
}

impl TodoLists {
    /// Builds the table from stored rows.
    pub fn from_rows(rows: impl IntoIterator<Item = (UserId, Vec<String>)>) -> Self {
        Self {
            users: rows.into_iter().collect(),
            dirty: false,
        }
    }

    /// The user's tasks in insertion order.
    pub fn get(&self, user: UserId) -> Vec<String> {
        self.users.get(&user).cloned().unwrap_or_default()
    }

    /// Appends a task and returns its 1-based position.
    pub fn add(&mut self, user: UserId, task: &str) -> Result<usize, TodoError> {
        let task = task.trim();
        if task.is_empty() {
            return Err(TodoError::EmptyTask);
        }
        if task.chars().count() > TODO_TASK_LENGTH_LIMIT {
            return Err(TodoError::TaskTooLong);
        }

        let list = self.users.entry(user).or_default();
        list.push(task.to_string());
        self.dirty = true;
        Ok(list.len())
    }

    /// Removes the task at a 1-based `index` and returns it.
    pub fn remove(&mut self, user: UserId, index: usize) -> Result<String, TodoError> {
        let list = match self.users.get_mut(&user) {
            Some(list) if !list.is_empty() => list,
            _ => return Err(TodoError::NoTasks),
        };

        if index == 0 || index > list.len() {
            return Err(TodoError::InvalidIndex {
                index,
                len: list.len(),
            });
        }

        self.dirty = true;
        Ok(list.remove(index - 1))
    }

    /// Empties the user's list and returns how many tasks were dropped.
    pub fn clear(&mut self, user: UserId) -> Result<usize, TodoError> {
        match self.users.get_mut(&user) {
            Some(list) if !list.is_empty() => {
                let removed = list.len();
                list.clear();
                self.dirty = true;
                Ok(removed)
            }
            _ => Err(TodoError::NoTasks),
        }
    }

    /// Copies every list for writing to the store.
    pub fn snapshot(&self) -> Vec<(UserId, Vec<String>)> {
        self.users
            .iter()
            .map(|(user, list)| (*user, list.clone()))
            .collect()
    }

    /// Whether the table changed since its last snapshot for writing.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Snapshots the table and marks it clean, if it changed.
    pub fn take_dirty(&mut self) -> Option<Vec<(UserId, Vec<String>)>> {
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
}

#[cfg(test)]
mod tests {
    use super::*;

    const USER: UserId = UserId(7);

    #[test]
    fn test_add_returns_position() {
        let mut todos = TodoLists::default();
        assert_eq!(todos.add(USER, "write tests"), Ok(1));
        assert_eq!(todos.add(USER, "  ship it  "), Ok(2));
        assert_eq!(todos.get(USER), vec!["write tests", "ship it"]);
    }

    #[test]
    fn test_add_validation() {
        let mut todos = TodoLists::default();
        assert_eq!(todos.add(USER, " "), Err(TodoError::EmptyTask));
        let long = "x".repeat(TODO_TASK_LENGTH_LIMIT + 1);
        assert_eq!(todos.add(USER, &long), Err(TodoError::TaskTooLong));
        assert!(todos.get(USER).is_empty());
        assert!(!todos.is_dirty());
    }

    #[test]
    fn test_remove_is_one_based() {
        let mut todos = TodoLists::from_rows([(USER, vec!["a".into(), "b".into(), "c".into()])]);
        assert_eq!(todos.remove(USER, 2), Ok("b".to_string()));
        assert_eq!(
            todos.remove(USER, 0),
            Err(TodoError::InvalidIndex { index: 0, len: 2 })
        );
        assert_eq!(
            todos.remove(USER, 3),
            Err(TodoError::InvalidIndex { index: 3, len: 2 })
        );
        assert_eq!(todos.get(USER), vec!["a", "c"]);
    }

    #[test]
    fn test_empty_list_errors() {
        let mut todos = TodoLists::default();
        assert_eq!(todos.remove(USER, 1), Err(TodoError::NoTasks));
        assert_eq!(todos.clear(USER), Err(TodoError::NoTasks));
    }

    #[test]
    fn test_clear_counts_tasks() {
        let mut todos = TodoLists::default();
        todos.add(USER, "a").unwrap();
        todos.add(USER, "b").unwrap();
        assert_eq!(todos.clear(USER), Ok(2));
        assert!(todos.get(USER).is_empty());
        assert_eq!(todos.snapshot(), vec![(USER, Vec::new())]);
    }
}
