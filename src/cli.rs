//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::timestamp::{parse_clock_time, parse_utc_offset};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Latecomers - attendance scan analytics
///
/// Reads an exported scan log and writes the latecomer dashboard:
/// daily counts, frequent latecomers, today's scans and the delay
/// distribution relative to the daily cutoff.
///
/// Examples:
///   latecomers --input scans.json
///   latecomers --input storage.json --format json --output dashboard.json
///   latecomers --input scans.json --records --date 2024-01-15
///   latecomers --input scans.json --now "2024-01-15T12:00:00" --cutoff 09:30
///   latecomers --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Scan log to analyze
    ///
    /// Either a JSON array of scans or a JSON object of storage keys
    /// whose value under --storage-key is the encoded scan array.
    #[arg(
        short,
        long,
        value_name = "FILE",
        required_unless_present = "init_config"
    )]
    pub input: Option<PathBuf>,

    /// Output file path for the report
    ///
    /// Defaults to the config file setting or latecomers_report.md
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .latecomers.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Treat this instant as "now" when selecting today's scans
    ///
    /// Accepts the same formats as the scan log. Defaults to the system clock.
    #[arg(long, value_name = "TIMESTAMP")]
    pub now: Option<String>,

    /// Daily cutoff after which a scan is late (HH:MM or HH:MM:SS)
    #[arg(long, value_name = "TIME")]
    pub cutoff: Option<String>,

    /// Offset of the reference time zone (e.g. +05:30)
    #[arg(long, value_name = "OFFSET", env = "LATECOMERS_UTC_OFFSET")]
    pub utc_offset: Option<String>,

    /// Number of students in the frequent-latecomer ranking
    #[arg(long, value_name = "COUNT")]
    pub top: Option<usize>,

    /// Ranked students seen more often than this are repeat offenders
    #[arg(long, value_name = "COUNT")]
    pub repeat_threshold: Option<usize>,

    /// Key holding the scan list when the input is a storage dump
    #[arg(long, value_name = "KEY", env = "LATECOMERS_STORAGE_KEY")]
    pub storage_key: Option<String>,

    /// Append the attendance records table to the report
    #[arg(long)]
    pub records: bool,

    /// Only list records from this day (YYYY-MM-DD); implies --records
    #[arg(long, value_name = "DATE")]
    pub date: Option<NaiveDate>,

    /// Exit with code 2 when any scan had an unreadable timestamp
    #[arg(long)]
    pub strict: bool,

    /// Dry run: load and parse the scan log, print counts and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .latecomers.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref cutoff) = self.cutoff {
            if parse_clock_time(cutoff).is_none() {
                return Err(format!("Cutoff must be HH:MM or HH:MM:SS, got '{}'", cutoff));
            }
        }

        if let Some(ref offset) = self.utc_offset {
            if parse_utc_offset(offset).is_none() {
                return Err(format!("UTC offset must look like +05:30, got '{}'", offset));
            }
        }

        if self.top == Some(0) {
            return Err("Top must be at least 1".to_string());
        }

        if let Some(ref key) = self.storage_key {
            if key.trim().is_empty() {
                return Err("Storage key cannot be empty".to_string());
            }
        }

        match self.input {
            Some(ref input) if !input.is_file() => Err(format!(
                "Input file does not exist: {}",
                input.display()
            )),
            Some(_) => Ok(()),
            None => Err("An input file is required (--input)".to_string()),
        }
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
