pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

use clap::Parser;
use commands::cli::{Cli, Command};
use config::{ClientConfig, ConfigOverrides};
use error::AppError;
use services::classifier::client::HttpPredictionService;
use services::workbench::Workbench;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = ClientConfig::resolve(&ConfigOverrides {
        api_url: cli.api_url.clone(),
        config_path: cli.config.clone(),
    })?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        info!(
            "Starting xray-lens v{} against {}",
            env!("CARGO_PKG_VERSION"),
            config.api_base_url
        );

        let service = HttpPredictionService::new(&config.api_base_url)?;
        let workbench = Workbench::new(Arc::new(service), &config);

        match cli.command.unwrap_or(Command::Shell { paths: Vec::new() }) {
            Command::Health => commands::classifier::health(&workbench).await.map(|_| ()),
            Command::Info => commands::classifier::model_info(&workbench).await,
            Command::Predict { paths, detail, json } => {
                commands::classifier::predict(&workbench, &paths, detail, json).await
            }
            Command::Shell { paths } => commands::shell::run_shell(workbench, paths).await,
        }
    })
}

/// Logs go to stderr so they stay out of the way of rendered output.
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
