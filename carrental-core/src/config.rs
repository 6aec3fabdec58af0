//! Configuration management
//!
//! Settings live in `<data dir>/settings.json`:
//! ```json
//! {
//!   "app": { "databaseFile": "carrental.duckdb" },
//!   "rental": { "blockOnActiveRentals": true }
//! }
//! ```
//! Keys this crate does not manage are preserved when saving.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::AvailabilityPolicy;

pub const DEFAULT_DATABASE_FILE: &str = "carrental.duckdb";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    #[serde(default)]
    rental: RentalSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    database_file: Option<String>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RentalSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    block_on_active_rentals: Option<bool>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// Parse a boolean environment value. Unrecognized text yields `None`.
fn parse_env_flag(value: &str) -> Option<bool> {
    match value {
        "true" | "1" | "yes" | "TRUE" | "YES" => Some(true),
        "false" | "0" | "no" | "FALSE" | "NO" => Some(false),
        _ => None,
    }
}

/// Car rental configuration (simplified view of settings)
#[derive(Debug, Clone)]
pub struct Config {
    /// File name of the rental database inside the data dir
    pub database_file: String,
    pub availability_policy: AvailabilityPolicy,
    // Keep the raw settings for preservation when saving
    _raw_settings: SettingsFile,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_file: DEFAULT_DATABASE_FILE.to_string(),
            availability_policy: AvailabilityPolicy::default(),
            _raw_settings: SettingsFile::default(),
        }
    }
}

impl Config {
    /// Replace the availability policy
    pub fn with_availability_policy(mut self, policy: AvailabilityPolicy) -> Self {
        self.availability_policy = policy;
        self
    }

    /// Load config from the data directory
    ///
    /// `CARRENTAL_BLOCK_ON_ACTIVE` overrides `rental.blockOnActiveRentals`.
    /// A malformed settings file is reported, not silently replaced.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let settings_path = data_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)
                .with_context(|| format!("Failed to read {}", settings_path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Invalid settings file {}", settings_path.display()))?
        } else {
            SettingsFile::default()
        };

        let env_flag = std::env::var("CARRENTAL_BLOCK_ON_ACTIVE")
            .ok()
            .as_deref()
            .and_then(parse_env_flag);
        let block_on_active = env_flag
            .or(raw.rental.block_on_active_rentals)
            .unwrap_or(true);

        Ok(Self {
            database_file: raw
                .app
                .database_file
                .clone()
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DATABASE_FILE.to_string()),
            availability_policy: if block_on_active {
                AvailabilityPolicy::ActiveBlocks
            } else {
                AvailabilityPolicy::ConfirmedOnly
            },
            _raw_settings: raw,
        })
    }

    /// Save config to the data directory, preserving unmanaged keys
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let settings_path = data_dir.join("settings.json");

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_else(|_| self._raw_settings.clone())
        } else {
            self._raw_settings.clone()
        };

        settings.app.database_file = Some(self.database_file.clone());
        settings.rental.block_on_active_rentals =
            Some(self.availability_policy == AvailabilityPolicy::ActiveBlocks);

        std::fs::create_dir_all(data_dir)?;
        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }
}
