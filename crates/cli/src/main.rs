//! MyTherapy CLI
//!
//! Builds the example index and produces counseling advice from the
//! command line.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AdviseCommand, IndexCommand, RetrieveCommand};
use mytherapy_core::logging::{self, LogFormat};
use mytherapy_core::{config::AppConfig, AppResult};
use std::path::PathBuf;
use std::process::ExitCode;

/// MyTherapy - retrieval-augmented advice for counselors
#[derive(Parser, Debug)]
#[command(name = "mytherapy")]
#[command(about = "Retrieval-augmented advice for counselors", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "MYTHERAPY_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "MYTHERAPY_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// Completion provider (openai, ollama)
    #[arg(short, long, global = true, env = "MYTHERAPY_PROVIDER")]
    provider: Option<String>,

    /// Completion model identifier
    #[arg(short, long, global = true, env = "MYTHERAPY_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build or inspect the example index
    Index(IndexCommand),

    /// Show the examples most similar to a description
    Retrieve(RetrieveCommand),

    /// Generate advice for a description of a patient's situation
    Advise(AdviseCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let config = AppConfig::load_for(cli.workspace, cli.config)?;

    let config = config.with_overrides(
        None,
        None,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    let log_format = LogFormat::parse(&config.log_format).unwrap_or_default();
    logging::init_logging(config.log_level.as_deref(), config.no_color, log_format)?;

    tracing::info!("MyTherapy CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.ensure_app_dir()?;

    let command_name = match &cli.command {
        Commands::Index(_) => "index",
        Commands::Retrieve(_) => "retrieve",
        Commands::Advise(_) => "advise",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Index(cmd) => cmd.execute(&config).await,
        Commands::Retrieve(cmd) => cmd.execute(&config).await,
        Commands::Advise(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
