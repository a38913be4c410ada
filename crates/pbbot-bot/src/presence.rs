//! Gateway presence showing how many servers and users the bot can see.

use async_trait::async_trait;
use pbbot_cache::PresenceSink;
use poise::serenity_prelude as serenity;
use std::sync::OnceLock;
use tracing::debug;

/// Activity text for the given counts.
pub fn presence_text(guilds: usize, users: usize) -> String {
    format!("{guilds} servers and {users} users")
}

/// Publishes the presence through the gateway once the client is connected.
#[derive(Debug, Default)]
pub struct DiscordPresence {
    ctx: OnceLock<serenity::Context>,
}

impl DiscordPresence {
    /// Creates a sink with no gateway attached yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches the gateway context. Only the first call has an effect.
    pub fn attach(&self, ctx: serenity::Context) {
        if self.ctx.set(ctx).is_err() {
            debug!("Presence context already attached");
        }
    }

    /// Whether a gateway context has been attached.
    pub fn is_attached(&self) -> bool {
        self.ctx.get().is_some()
    }
}

#[async_trait]
impl PresenceSink for DiscordPresence {
    async fn refresh(&self) -> anyhow::Result<()> {
        let Some(ctx) = self.ctx.get() else {
            debug!("Skipping presence refresh, not connected yet");
            return Ok(());
        };

        let text = presence_text(ctx.cache.guilds().len(), ctx.cache.user_count());
        debug!("Setting presence to `Watching {}`", text);
        ctx.set_presence(
            Some(serenity::ActivityData::watching(text)),
            serenity::OnlineStatus::Idle,
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_text() {
        assert_eq!(presence_text(3, 120), "3 servers and 120 users");
    }

    #[tokio::test]
    async fn test_refresh_before_connect_is_noop() {
        let presence = DiscordPresence::new();
        assert!(!presence.is_attached());
        assert!(presence.refresh().await.is_ok());
    }
}
