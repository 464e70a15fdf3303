//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.latecomers.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".latecomers.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Cutoff and time zone settings.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Dashboard ranking settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Scan log settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
        }
    }
}

fn default_output() -> String {
    "latecomers_report.md".to_string()
}

/// When the school day starts and which clock it runs on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Daily cutoff, `HH:MM` or `HH:MM:SS`.
    #[serde(default = "default_cutoff")]
    pub cutoff: String,

    /// Offset of the reference time zone, `±HH:MM`.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            cutoff: default_cutoff(),
            utc_offset: default_utc_offset(),
        }
    }
}

fn default_cutoff() -> String {
    "09:40:00".to_string()
}

fn default_utc_offset() -> String {
    "+05:30".to_string()
}

/// Dashboard ranking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Number of students in the frequent-latecomer ranking.
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Ranked students seen more often than this are repeat offenders.
    #[serde(default = "default_repeat_threshold")]
    pub repeat_threshold: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            repeat_threshold: default_repeat_threshold(),
        }
    }
}

fn default_top_n() -> usize {
    5
}

fn default_repeat_threshold() -> usize {
    3
}

/// Scan log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Key holding the scan list in a storage dump.
    #[serde(default = "default_storage_key")]
    pub key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key: default_storage_key(),
        }
    }
}

fn default_storage_key() -> String {
    "latecomersData".to_string()
}

/// Report generation settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Append the attendance records table.
    #[serde(default)]
    pub include_records: bool,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were actually given.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if let Some(ref cutoff) = args.cutoff {
            self.schedule.cutoff = cutoff.clone();
        }
        if let Some(ref offset) = args.utc_offset {
            self.schedule.utc_offset = offset.clone();
        }

        if let Some(top) = args.top {
            self.dashboard.top_n = top;
        }
        if let Some(threshold) = args.repeat_threshold {
            self.dashboard.repeat_threshold = threshold;
        }

        if let Some(ref key) = args.storage_key {
            self.store.key = key.clone();
        }

        // Flags always override
        if args.records || args.date.is_some() {
            self.report.include_records = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schedule.cutoff, "09:40:00");
        assert_eq!(config.schedule.utc_offset, "+05:30");
        assert_eq!(config.dashboard.top_n, 5);
        assert_eq!(config.dashboard.repeat_threshold, 3);
        assert_eq!(config.store.key, "latecomersData");
        assert!(!config.report.include_records);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "weekly.md"

[schedule]
cutoff = "08:30"

[dashboard]
top_n = 10
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, "weekly.md");
        assert_eq!(config.schedule.cutoff, "08:30");
        assert_eq!(config.schedule.utc_offset, "+05:30");
        assert_eq!(config.dashboard.top_n, 10);
        assert_eq!(config.dashboard.repeat_threshold, 3);
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[schedule]"));
        assert!(toml_str.contains("[dashboard]"));
        assert!(toml_str.contains("latecomersData"));

        let round_trip: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(round_trip.dashboard.top_n, 5);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[store]\nkey = \"scans\"\n",
        )
        .unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.store.key, "scans");

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[store\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }
}
