mod commands;
mod runtime;
mod utils;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tempusstack_core::STACK_FILE_ENV;
use tempusstack_orchestrator::DEFAULT_LOG_TAIL;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tempusstack")]
#[command(about = "Start, inspect and tear down a local container stack from one YAML file.", long_about = None)]
struct Cli {
    /// Path to the stack file (default: ./tempusstack.yaml)
    #[arg(short, long, global = true, env = STACK_FILE_ENV)]
    config: Option<PathBuf>,

    /// Show per-step progress
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start every service in the stack
    Up {
        /// Return right after start instead of waiting for Ctrl+C
        #[arg(short, long)]
        detached: bool,
    },
    /// Stop and remove every tempusstack container
    Down,
    /// List tempusstack containers
    Status,
    /// Show the logs of a service
    Logs {
        /// Service name
        service: String,
        /// Keep streaming new output
        #[arg(short, long)]
        follow: bool,
        /// Number of lines from the end
        #[arg(short = 'n', long, default_value_t = DEFAULT_LOG_TAIL)]
        tail: usize,
    },
    /// Restart the container of a service
    Restart {
        /// Service name
        service: String,
    },
    /// Check the stack file without touching Docker
    Validate,
    /// Print version information
    Version,
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.config.as_deref();
    debug!(config = ?config, verbose = cli.verbose, "Parsed command line");

    match cli.command {
        Commands::Up { detached } => commands::up::handle(config, detached, cli.verbose).await?,
        Commands::Down => commands::down::handle(cli.verbose).await?,
        Commands::Status => commands::status::handle().await?,
        Commands::Logs {
            service,
            follow,
            tail,
        } => commands::logs::handle(&service, follow, tail).await?,
        Commands::Restart { service } => commands::restart::handle(&service, cli.verbose).await?,
        Commands::Validate => commands::validate::handle(config)?,
        Commands::Version => {
            println!("tempusstack {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
