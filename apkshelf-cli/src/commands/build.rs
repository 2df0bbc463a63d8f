//! Build command - scan categories and write manifests.

use std::path::{Path, PathBuf};

use apkshelf::apk::ApkInspector;
use apkshelf::catalog::{format_size, CategoryReport, IconOutcome, ManifestBuilder};
use apkshelf::config::{CatalogConfig, Category};
use clap::Args;
use console::style;

use super::common::{load_config, parse_category, NamingArg};
use crate::error::CliError;

/// Arguments for the build command. Each one overrides the config file.
#[derive(Debug, Clone, Default, Args)]
pub struct BuildArgs {
    /// Base URL of the file host (e.g. https://raw.githubusercontent.com/user/repo/main)
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Directory to write manifests to
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Manifest file naming
    #[arg(long, value_enum)]
    pub naming: Option<NamingArg>,

    /// Directory containing the category directories
    #[arg(long, value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Leave versionName and versionCode out of the manifests
    #[arg(long)]
    pub no_versions: bool,

    /// Category to build, as NAME or NAME=DIR (repeatable, replaces configured categories)
    #[arg(long = "category", value_name = "NAME[=DIR]", value_parser = parse_category)]
    pub categories: Vec<Category>,
}

impl BuildArgs {
    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply(&self, mut config: CatalogConfig) -> CatalogConfig {
        if let Some(url) = &self.base_url {
            config = config.with_remote_base_url(url.clone());
        }
        if let Some(dir) = &self.output_dir {
            config = config.with_output_dir(dir.clone());
        }
        if let Some(naming) = self.naming {
            config = config.with_naming(naming.into());
        }
        if let Some(root) = &self.root {
            config = config.with_root_dir(root.clone());
        }
        if self.no_versions {
            config = config.with_collect_versions(false);
        }
        if !self.categories.is_empty() {
            config = config.with_categories(self.categories.clone());
        }
        config
    }
}

/// Run the build command.
pub fn run(args: BuildArgs, config_path: Option<&Path>) -> Result<(), CliError> {
    let config = args.apply(load_config(config_path)?);
    config.validate()?;
    tracing::info!(
        root = %config.root_dir.display(),
        base_url = config.base_url(),
        output = %config.manifest_dir().display(),
        naming = %config.naming,
        categories = config.categories.len(),
        "Building manifests"
    );

    let inspector = ApkInspector::new();
    let reports = ManifestBuilder::new(&config, &inspector).build_all()?;
    tracing::info!(
        manifests = reports.iter().filter(|r| r.is_written()).count(),
        packages = reports.iter().map(CategoryReport::added_count).sum::<usize>(),
        "Build complete"
    );

    println!();
    for report in &reports {
        print_report(report);
    }
    print_totals(&reports);
    Ok(())
}

fn print_report(report: &CategoryReport) {
    let Some(manifest) = &report.manifest_path else {
        println!(
            "{} {}",
            style(&report.category).bold(),
            style("directory not found, no manifest written").yellow()
        );
        println!();
        return;
    };

    println!(
        "{}  {} added, {} skipped, {}",
        style(&report.category).bold(),
        style(report.added_count()).green(),
        report.skipped_count(),
        format_size(report.total_bytes())
    );
    println!("  Manifest: {}", manifest.display());

    for (file, reason) in report.skipped() {
        println!("  {} {}: {}", style("skipped").yellow(), file, reason);
    }
    for (package, icon) in report.missing_icons() {
        let detail = match icon {
            IconOutcome::Failed(msg) => msg.as_str(),
            _ => "no icon declared",
        };
        println!("  {} {}: {}", style("no icon").dim(), package, detail);
    }
    println!();
}

fn print_totals(reports: &[CategoryReport]) {
    let added: usize = reports.iter().map(CategoryReport::added_count).sum();
    let skipped: usize = reports.iter().map(CategoryReport::skipped_count).sum();
    let bytes: u64 = reports.iter().map(CategoryReport::total_bytes).sum();
    let written = reports.iter().filter(|r| r.is_written()).count();

    println!(
        "{} {} packages in {} manifest(s), {} skipped, {} total",
        style("Done:").green().bold(),
        added,
        written,
        skipped,
        format_size(bytes)
    );
}
