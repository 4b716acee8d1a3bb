mod bootstrap;
mod cli;
mod commands;
mod config;
mod render;
mod runtime;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::CarlogConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "carlog=info,carlog_cli=info";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => CarlogConfig::config_path()?,
    };

    if let Commands::ConfigPath = cli.command {
        if !config_path.exists() {
            CarlogConfig::default().save_to(&config_path)?;
        }
        println!("{}", config_path.display());
        return Ok(());
    }

    let config = CarlogConfig::load_from(&config_path)?;
    let mut session = bootstrap::open_ledger(&config)?;
    commands::run(cli.command, &mut session, &mut std::io::stdout()).await
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
