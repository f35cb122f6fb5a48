//! Tessera CLI - Command-line driver for the Tessera extension runtime.

mod catalog;
mod commands;
mod discovery;
mod output;
mod runtime;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use miette::Result;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tessera")]
#[command(
    author,
    version,
    about = "A hot-loadable extension runtime with transactional load and exact unload"
)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to tessera.json (auto-detected if not specified)
    #[arg(short = 'f', long, global = true)]
    file: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the configured extensions and drive frames
    Run {
        /// Number of frames to run (overrides the config; 0 runs until Ctrl-C)
        #[arg(short = 'n', long)]
        frames: Option<u64>,
    },

    /// List built-in extensions and what each one registers
    List {
        /// Show registered IDs for every extension
        #[arg(short, long)]
        detailed: bool,
    },

    /// Validate tessera.json and trial-load its extensions
    Validate,

    /// Run frames and hot-reload extensions when tessera.json changes
    Watch {
        /// Clear the screen on every reload
        #[arg(long)]
        clear: bool,
    },

    /// Initialize a new tessera.json
    Init {
        /// Force overwrite existing tessera.json
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(cli).await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{:?}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    // Init does not need an existing config
    if let Some(Commands::Init { force }) = &cli.command {
        return commands::init::execute(*force);
    }

    let config_path = match cli.file {
        Some(path) => std::path::PathBuf::from(path),
        None => discovery::find_config()?,
    };

    match cli.command {
        Some(Commands::Run { frames }) => commands::run::execute(&config_path, frames).await,
        Some(Commands::List { detailed }) => commands::list::execute(&config_path, detailed),
        Some(Commands::Validate) => commands::validate::execute(&config_path),
        Some(Commands::Watch { clear }) => commands::watch::execute(&config_path, clear).await,
        Some(Commands::Init { .. }) => unreachable!("Init is handled earlier"),
        None => commands::run::execute(&config_path, None).await,
    }
}
