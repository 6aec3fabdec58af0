//! CLI command implementations

pub mod car;
pub mod customer;
pub mod logs;
pub mod rental;
pub mod status;
pub mod user;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use carrental_core::services::{EntryPoint, LoggingService};
use carrental_core::RentalContext;
use chrono::NaiveDateTime;
use dialoguer::Confirm;

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger() -> Option<LoggingService> {
    let data_dir = get_data_dir().ok()?;
    std::fs::create_dir_all(&data_dir).ok()?;
    LoggingService::new(&data_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Data directory from CARRENTAL_DIR, or ~/.carrental
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("CARRENTAL_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".carrental"))
        .ok_or_else(|| anyhow!("Could not find home directory; set CARRENTAL_DIR"))
}

/// Open the rental database in the data directory
pub fn get_context() -> Result<RentalContext> {
    let data_dir = get_data_dir()?;
    RentalContext::new(&data_dir).context("Failed to initialize car rental context")
}

/// clap value parser for rental timestamps
pub fn parse_datetime(input: &str) -> std::result::Result<NaiveDateTime, String> {
    carrental_core::domain::rental::parse_timestamp(input).map_err(|e| e.to_string())
}

/// Ask before a destructive action unless `force` or JSON output is set
pub fn confirm(prompt: &str, force: bool, json: bool) -> Result<bool> {
    if force || json {
        return Ok(true);
    }
    Ok(Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?)
}
