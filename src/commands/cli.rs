use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "xray-lens",
    version,
    about = "Classify chest X-ray images with a remote model service"
)]
pub struct Cli {
    /// API root of the classification service
    #[arg(long, global = true, env = "XRAY_LENS_API_URL")]
    pub api_url: Option<String>,

    /// TOML config file
    #[arg(long, global = true, env = "XRAY_LENS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log at debug level (RUST_LOG still wins when set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check whether the service is up and its model is loaded
    Health,
    /// Show what the service reports about its model
    Info,
    /// Submit images once and print the predictions
    Predict {
        /// Image files or directories of images
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Also print the per-class probabilities of each result
        #[arg(long)]
        detail: bool,
        /// Print results as JSON
        #[arg(long, conflicts_with = "detail")]
        json: bool,
    },
    /// Interactive session (the default)
    Shell {
        /// Images to select on start
        paths: Vec<PathBuf>,
    },
}
