use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() {
    // Log panics through tracing before exiting
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Application panicked: {}", panic_info);
        std::process::exit(1);
    }));

    // Load environment variables from .env file
    if let Err(e) = dotenvy::dotenv() {
        // A missing .env file is fine
        tracing::debug!("No .env file found or error loading it: {}", e);
    }

    let cli = Cli::parse();

    // Initialize logging/tracing
    if let Err(e) = init_logging(cli.debug) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    // Execute CLI command
    if let Err(e) = cli.execute().await {
        error!("Application error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(debug: bool) -> Result<()> {
    let fallback = if debug { "modals=debug" } else { "modals=info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| fallback.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;

    Ok(())
}
