//! CLI commands and argument parsing
//!
//! This module defines the command-line interface structure using clap and
//! wires the real Azure services into the orchestrator.

use clap::{Args, Parser, Subcommand};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::auth::{AzureAuthProvider, ClientSecretProvider, Credentials};
use crate::azure::{AzureResourceManager, PollSettings};
use crate::blob::AzureBlobStore;
use crate::config::{init_default_config, load_config, Config};
use crate::deploy::{FtpPublisher, ReqwestProbe};
use crate::error::Result;
use crate::orchestrator::{
    ConsoleInteraction, ConsoleReporter, Interaction, NonInteractive, Orchestrator, Reporter,
    RunPlan, Services,
};
use crate::utils::names::NameGenerator;

#[derive(Parser)]
#[command(name = "azprov")]
#[command(about = "Provision a storage account and web app, deploy an archive, then delete everything")]
#[command(version, author)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full provisioning sequence and clean up afterwards
    Run(RunArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Configuration file to use instead of the default location
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Azure region for every created resource
    #[arg(long)]
    pub region: Option<String>,

    /// Directory that relative asset paths are resolved against
    #[arg(long, value_name = "DIR")]
    pub asset_root: Option<PathBuf>,

    /// Wait for Enter before deleting the resource group
    #[arg(long)]
    pub pause_before_cleanup: bool,

    /// Number of blob uploads allowed in flight at once
    #[arg(long, value_name = "N")]
    pub max_concurrent_uploads: Option<usize>,
}

impl RunArgs {
    /// Apply command-line overrides on top of file and environment settings
    pub fn apply(&self, config: &mut Config) {
        if let Some(region) = &self.region {
            config.region = region.clone();
        }
        if let Some(asset_root) = &self.asset_root {
            config.asset_root = asset_root.clone();
        }
        if self.pause_before_cleanup {
            config.pause_before_cleanup = true;
        }
        if let Some(limit) = self.max_concurrent_uploads {
            config.max_concurrent_uploads = limit;
        }
    }
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show {
        /// Configuration file to read
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Write a default configuration file if none exists
    Init {
        /// Where to write the file (defaults to the user config directory)
        #[arg(long, value_name = "FILE")]
        path: Option<PathBuf>,
    },
}

impl Cli {
    /// Configuration file named on the command line, if any
    pub fn config_path(&self) -> Option<&Path> {
        match &self.command {
            Commands::Run(args) => args.config.as_deref(),
            Commands::Config {
                command: ConfigCommands::Show { config },
            } => config.as_deref(),
            Commands::Config { .. } => None,
        }
    }

    /// Debug logging is on when `--debug` is given or the effective
    /// configuration sets `debug`. A configuration that fails to load is
    /// reported later by the command itself.
    pub async fn debug_enabled(&self) -> bool {
        if self.debug {
            return true;
        }
        load_config(self.config_path())
            .await
            .map(|config| config.debug)
            .unwrap_or(false)
    }

    pub async fn execute(self) -> Result<()> {
        let no_color = self.no_color;

        match self.command {
            Commands::Run(args) => execute_run(args, no_color).await,
            Commands::Config { command } => execute_config_command(command).await,
        }
    }
}

async fn execute_run(args: RunArgs, no_color: bool) -> Result<()> {
    let mut config = load_config(args.config.as_deref()).await?;
    args.apply(&mut config);
    config.validate()?;

    let credentials = Credentials::from_env()?;
    let auth: Arc<dyn AzureAuthProvider> = Arc::new(ClientSecretProvider::new(&credentials)?);
    tracing::info!(
        "Authenticated as client {} in tenant {} for subscription {}",
        credentials.client_id,
        auth.get_tenant_id().await?,
        credentials.subscription_id
    );

    let services = build_services(&config, auth, &credentials, no_color)?;
    let plan = RunPlan::from_config(&config, &mut NameGenerator::new())?;
    plan.verify_local_files()?;

    tracing::info!(
        "Provisioning resource group {} in {}",
        plan.resource_group,
        plan.region
    );
    let outcome = Orchestrator::new(plan, services)
        .run_until(shutdown_signal())
        .await;
    tracing::info!(
        "Run finished after {} (cleanup: {:?})",
        outcome.reached,
        outcome.cleanup
    );

    outcome.into_result()
}

fn build_services(
    config: &Config,
    auth: Arc<dyn AzureAuthProvider>,
    credentials: &Credentials,
    no_color: bool,
) -> Result<Services> {
    let poll = PollSettings {
        interval: config.poll_interval(),
        timeout: config.operation_timeout(),
    };
    let resources = AzureResourceManager::new(
        auth,
        &config.management_endpoint,
        credentials.subscription_id.clone(),
        poll,
    )?;
    let probe = ReqwestProbe::new(config.warmup.timeout(), &config.warmup.headers)?;
    let reporter: Arc<dyn Reporter> = Arc::new(ConsoleReporter::new(no_color));
    let interaction: Arc<dyn Interaction> = if config.pause_before_cleanup {
        Arc::new(ConsoleInteraction)
    } else {
        Arc::new(NonInteractive)
    };

    Ok(Services {
        resources: Arc::new(resources),
        blobs: Arc::new(AzureBlobStore::new()),
        publisher: Arc::new(FtpPublisher::new()),
        probe: Arc::new(probe),
        reporter,
        interaction,
    })
}

/// Resolves on Ctrl-C. If the handler cannot be installed it never resolves.
fn shutdown_signal() -> impl Future<Output = ()> + Send {
    async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Unable to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

async fn execute_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show { config } => execute_config_show(config).await,
        ConfigCommands::Init { path } => execute_config_init(path).await,
    }
}

async fn execute_config_show(path: Option<PathBuf>) -> Result<()> {
    let config = load_config(path.as_deref()).await?;
    print!("{}", config.to_toml()?);
    Ok(())
}

async fn execute_config_init(path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => Config::get_config_path()?,
    };

    if init_default_config(&path).await? {
        println!("Wrote default configuration to {}", path.display());
    } else {
        println!("Configuration already exists at {}", path.display());
    }
    Ok(())
}
