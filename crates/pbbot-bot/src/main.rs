//! Main entry point for PB Bot.

use clap::Parser;
use pbbot_bot::{BotResult, PbBot};
use pbbot_common::init_logging;
use pbbot_config::ConfigLoader;
use std::path::PathBuf;
use tracing::info;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter, overriding the configuration file
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> BotResult<()> {
    let args = Args::parse();

    let mut config = ConfigLoader::load(args.config.as_deref())?;
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    let _guard = init_logging(&config.logging)?;
    info!("Starting PB Bot v{}", env!("CARGO_PKG_VERSION"));

    PbBot::new(config).run().await
}
