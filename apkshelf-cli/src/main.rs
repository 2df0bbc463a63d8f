//! apkshelf CLI - Command-line interface
//!
//! Builds JSON catalogs from directories of Android packages using the
//! apkshelf library.

mod commands;
mod error;

use std::path::PathBuf;
use std::process;

use apkshelf::logging::{init_logging, LogConfig};
use clap::{ArgAction, Parser, Subcommand};
use console::style;

use commands::build::BuildArgs;
use commands::config::ConfigCommands;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "apkshelf", version, about, long_about = None)]
struct Cli {
    /// Configuration file (default: ./apkshelf.ini)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Also write log output to this file
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Build manifests for all categories (default)
    Build(BuildArgs),

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the metadata of a single package file
    Inspect {
        /// Package file to inspect
        file: PathBuf,
    },

    /// Show configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    let mut log_config = LogConfig::default().with_verbosity(cli.verbose);
    if let Some(path) = &cli.log_file {
        log_config = log_config.with_file(path);
    }
    let _guard = match init_logging(&log_config) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("{} {}", style("Warning:").yellow(), e);
            None
        }
    };

    if let Err(e) = run(cli) {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();
    match cli.command.unwrap_or(Commands::Build(BuildArgs::default())) {
        Commands::Build(args) => commands::build::run(args, config_path),
        Commands::Init { force } => {
            commands::init::run(&commands::common::config_path(config_path), force)
        }
        Commands::Inspect { file } => commands::inspect::run(&file),
        Commands::Config(command) => commands::config::run(command, config_path),
    }
}
