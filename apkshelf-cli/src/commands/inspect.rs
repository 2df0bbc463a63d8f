//! Inspect command - show what a package file reports.

use std::fs;
use std::path::Path;

use apkshelf::apk::{ApkInspector, PackageInspector};
use apkshelf::catalog::format_size;
use console::style;

use crate::error::CliError;

/// Run the inspect command.
pub fn run(file: &Path) -> Result<(), CliError> {
    let package = ApkInspector::new().open(file)?;
    let size = fs::metadata(file)
        .map(|m| format_size(m.len()))
        .unwrap_or_else(|_| "unknown".to_string());

    println!("{}", style(file.display()).bold());
    print_field("Package", package.package_name());
    print_field("Name", package.app_name());
    print_field("Version name", package.version_name());
    print_field("Version code", package.version_code());
    println!("  {:<14}{}", "Size", size);

    match package.icon_path() {
        Ok(Some(icon)) => println!("  {:<14}{}", "Icon", icon),
        Ok(None) => println!("  {:<14}{}", "Icon", style("(none)").dim()),
        Err(e) => println!("  {:<14}{}", "Icon", style(e).red()),
    }
    Ok(())
}

fn print_field(label: &str, value: Option<&str>) {
    match value {
        Some(value) => println!("  {:<14}{}", label, value),
        None => println!("  {:<14}{}", label, style("(not set)").dim()),
    }
}
