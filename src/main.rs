//! azprov - Azure web app provisioning walkthrough
//!
//! Command-line entry point. All errors end up here, are logged once and turn
//! into a non-zero exit code.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use azprov::cli::Cli;
use azprov::Result;

#[tokio::main]
async fn main() {
    // Parse command-line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.debug_enabled().await);

    // Execute the command
    if let Err(e) = run(cli).await {
        if e.is_setup_error() {
            error!("Setup failed, nothing was provisioned: {}", e);
        } else {
            error!("Error: {}", e);
        }
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    info!("Starting azprov");

    cli.execute().await?;

    Ok(())
}

fn init_logging(debug: bool) {
    let default_filter = if debug { "azprov=debug" } else { "azprov=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
