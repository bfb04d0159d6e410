// src/main.rs

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod cli;
mod settings;
mod sheets;

use cli::Cli;

const DEFAULT_LOG_FILTER: &str = "info,hyper=warn,reqwest=warn,rusqlite=warn";

#[tokio::main]
async fn main() {
    // A missing .env is fine; the key may live in the environment or the keyring
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = cli::dispatch(cli).await {
        error!("{}", e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
