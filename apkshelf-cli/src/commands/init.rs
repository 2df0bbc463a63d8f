//! Init command - write a default configuration file.

use std::path::Path;

use apkshelf::config::CatalogConfig;

use crate::error::CliError;

/// Run the init command.
pub fn run(path: &Path, force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::Config(format!(
            "Config file {} already exists. Use --force to overwrite it.",
            path.display()
        )));
    }

    CatalogConfig::default().save(path)?;

    println!("Configuration file: {}", path.display());
    println!();
    println!("Edit this file to set the remote base URL and categories.");
    println!("CLI arguments override config file values when specified.");
    Ok(())
}
