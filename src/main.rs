#![warn(clippy::all, clippy::pedantic)]

use anyhow::Result;
use clap::Parser;
use pocket_sre::Config;
use pocket_sre::app::dispatch::dispatch;
use pocket_sre::cli::Cli;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Warning: failed to install log subscriber: {e}");
    }

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load_or_init()?,
    };
    dispatch(cli, config).await
}
