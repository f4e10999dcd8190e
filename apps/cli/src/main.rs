//! VisionOps CLI - Command-line interface for the object-detection workflow
//!
//! This CLI provides a `vops` command for preparing detector datasets and
//! promoting trained weights through the model registry.

mod commands;
mod config;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{ConfigCommand, DatasetCommand, RegistryCommand};

/// VisionOps CLI - Dataset preparation and model promotion for object detection
#[derive(Parser, Debug)]
#[command(
    name = "vops",
    author,
    version,
    about = "VisionOps - Dataset preparation and model promotion for object detection",
    long_about = "VisionOps (vops) splits and validates YOLO-format datasets and promotes trained weights\nthrough a champion/challenger model registry."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Configuration file (defaults to ./visionops.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Workspace directory holding the registry (overrides registry.root)
    #[arg(short = 'w', long, global = true)]
    workspace: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Dataset partitioning, manifest and validation
    #[command(subcommand)]
    Dataset(DatasetCommand),

    /// Training runs, promotion and alias resolution
    #[command(subcommand)]
    Registry(RegistryCommand),

    /// Inspect the resolved configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize tracing
    let level = match args.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // Logs go to stderr so --json output stays parseable.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = config::load_config(args.config.as_deref(), args.workspace)?;

    match args.command {
        Command::Dataset(cmd) => commands::dataset::execute(cmd, &config),
        Command::Registry(cmd) => commands::registry::execute(cmd, &config).await,
        Command::Config(cmd) => commands::config::execute(cmd, &config),
    }
}
