//! Command error type.

use pbbot_cache::{PrefixError, StoreError, TodoError};
use pbbot_common::format_seconds;
use std::time::Duration;
use thiserror::Error;

/// Errors a command or command check can return.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The invoker or channel is rate limited.
    #[error("Slow down! You can use this again in {}.", format_seconds(.retry_after.to_owned()))]
    OnCooldown {
        /// Time until the bucket refills.
        retry_after: Duration,
    },

    /// A prefix edit was rejected.
    #[error(transparent)]
    Prefix(#[from] PrefixError),

    /// A todo edit was rejected.
    #[error(transparent)]
    Todo(#[from] TodoError),

    /// An argument could not be used.
    #[error("{0}")]
    InvalidArgument(String),

    /// The store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Discord rejected a request.
    #[error("Discord error: {0}")]
    Discord(#[from] serenity::Error),
}

impl CommandError {
    /// Text to show the invoker, or `None` for internal failures that are
    /// logged instead.
    pub fn user_message(&self) -> Option<String> {
        match self {
            Self::OnCooldown { .. } | Self::Prefix(_) | Self::Todo(_) | Self::InvalidArgument(_) => {
                Some(self.to_string())
            }
            Self::Store(_) | Self::Discord(_) => None,
        }
    }
}

/// Result type for commands.
pub type CommandResult<T = ()> = Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_errors_have_messages() {
        let cooldown = CommandError::OnCooldown {
            retry_after: Duration::from_millis(4250),
        };
        assert_eq!(
            cooldown.user_message().as_deref(),
            Some("Slow down! You can use this again in 4.25s.")
        );

        let prefix = CommandError::from(PrefixError::TooLong);
        assert_eq!(
            prefix.user_message().as_deref(),
            Some("Sorry, that prefix is too long (>10 characters).")
        );

        let todo = CommandError::from(TodoError::InvalidIndex { index: 4, len: 2 });
        assert!(todo.user_message().unwrap().contains("`4`"));
    }

    #[test]
    fn test_internal_errors_are_hidden() {
        let error = CommandError::from(StoreError::Unavailable("down".to_string()));
        assert!(error.user_message().is_none());
        assert_eq!(error.to_string(), "Store error: Store unavailable: down");
    }
}
