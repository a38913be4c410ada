//! Help command backed by Poise's builtin help renderer.

use crate::error::CommandResult;
use crate::framework::Context;

const EXTRA_TEXT: &str = "Mention me to see this server's prefixes.";

/// Shows the command list, or help for one command.
#[poise::command(prefix_command)]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Command to show help for"]
    #[rest]
    command: Option<String>,
) -> CommandResult {
    let config = poise::builtins::HelpConfiguration {
        extra_text_at_bottom: EXTRA_TEXT,
        ephemeral: false,
        ..Default::default()
    };
    poise::builtins::help(ctx, command.as_deref(), config).await?;
    Ok(())
}
