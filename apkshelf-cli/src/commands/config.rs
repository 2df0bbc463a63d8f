//! Configuration CLI commands.
//!
//! Provides `config show` and `config path` for inspecting the effective
//! configuration.

use std::path::Path;

use clap::Subcommand;

use super::common::{config_path, load_config};
use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration as INI
    Show,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands, cli_path: Option<&Path>) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => run_show(cli_path),
        ConfigCommands::Path => run_path(cli_path),
    }
}

fn run_show(cli_path: Option<&Path>) -> Result<(), CliError> {
    let config = load_config(cli_path)?;
    println!("; root = {}", config.root_dir.display());
    print!("{}", config.to_ini_string());
    Ok(())
}

fn run_path(cli_path: Option<&Path>) -> Result<(), CliError> {
    let path = config_path(cli_path);
    if path.exists() {
        println!("{}", path.display());
    } else {
        println!("{} (not created, defaults in use)", path.display());
    }
    Ok(())
}
