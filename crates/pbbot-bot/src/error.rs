//! Application-wide error types using thiserror.

use pbbot_cache::StoreError;
use pbbot_common::PbBotError;
use pbbot_config::ConfigError;
use poise::serenity_prelude as serenity;

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum BotError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Logging or another shared facility failed to start.
    #[error(transparent)]
    Common(#[from] PbBotError),

    /// The store could not be reached or loaded.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Discord/Serenity error.
    #[error("Discord error: {0}")]
    Discord(#[from] serenity::Error),
}

/// Result type for the bot application.
pub type BotResult<T> = Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let error = BotError::from(StoreError::Unavailable("connection refused".to_string()));
        assert_eq!(
            error.to_string(),
            "Store error: Store unavailable: connection refused"
        );

        let error = BotError::from(PbBotError::logging("bad filter"));
        assert_eq!(error.to_string(), "Logging error: bad filter");
    }
}
