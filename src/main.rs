//! Latecomers - attendance scan analytics
//!
//! A CLI tool that reads an exported barcode-scan log and produces the
//! latecomer dashboard as a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable log, bad config, etc.)
//!   2 - `--strict` was set and at least one scan was skipped

mod analysis;
mod cli;
mod config;
mod models;
mod records;
mod report;
mod store;
mod timestamp;

use analysis::{Aggregator, AggregatorConfig};
use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use models::{Report, ReportMetadata};
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("Latecomers v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .latecomers.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to change the cutoff, time zone, ranking size and more.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete analysis. Returns the exit code (0 or 2).
fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let aggregator = Aggregator::new(
        AggregatorConfig::try_from(&config).context("Invalid schedule settings")?,
    );
    let now = resolve_now(&args, &aggregator)?;

    let input = args.input.as_deref().context("An input file is required")?;
    let log = store::load_scans(input, &config.store.key)
        .with_context(|| format!("Failed to load scan log {}", input.display()))?;

    if args.dry_run {
        return Ok(handle_dry_run(&aggregator, &log, now, args.strict));
    }

    let (parsed, unreadable) = aggregator.parse_scans(&log.scans);
    let skipped = unreadable + log.malformed;
    if skipped > 0 {
        warn!(
            "{} of {} log entries were skipped",
            skipped,
            log.scans.len() + log.malformed
        );
    }

    let mut snapshot = aggregator.aggregate_records(&parsed, now);
    snapshot.skipped_records = skipped;

    let settings = aggregator.config();
    let record_rows = config.report.include_records.then(|| {
        let rows = records::build_rows(&parsed, &settings.utc_offset);
        records::filter_by_date(rows, args.date)
    });

    let summary = snapshot.summary.clone();
    let report = Report {
        metadata: ReportMetadata {
            source: input.display().to_string(),
            generated_at: now,
            cutoff: settings.cutoff.format("%H:%M:%S").to_string(),
            utc_offset: settings.utc_offset.to_string(),
            records_parsed: parsed.len(),
            records_skipped: skipped,
        },
        snapshot,
        records: record_rows,
        records_date: args.date,
    };

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => report::generate_markdown_report(&report),
    };

    let output_path = Path::new(&config.general.output);
    std::fs::write(output_path, &output)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    if !args.quiet {
        println!("\n📊 Latecomer Summary:");
        println!("   Total scans: {}", summary.total_latecomers);
        println!("   Repeat offenders: {}", summary.repeat_offenders);
        println!("   Average delay: {} min", summary.average_delay);
        println!("   Today's scans: {}", summary.todays_latecomers);
        if skipped > 0 {
            println!("   Skipped (unreadable entry or timestamp): {}", skipped);
        }
        println!("\n✅ Report saved to: {}", output_path.display());
    }

    Ok(strict_exit_code(args.strict, skipped))
}

/// Handle --dry-run: parse the log, print what would be reported, exit.
fn handle_dry_run(
    aggregator: &Aggregator,
    log: &models::ScanLog,
    now: DateTime<FixedOffset>,
    strict: bool,
) -> i32 {
    println!("\n🔍 Dry run: parsing scan log (no report written)...\n");

    let snapshot = aggregator.aggregate_log(log, now);

    println!("   Entries in log: {}", log.scans.len() + log.malformed);
    println!("   Readable: {}", snapshot.summary.total_latecomers);
    println!("   Skipped: {}", snapshot.skipped_records);
    println!("   Distinct days: {}", snapshot.daily.len());
    if let (Some(first), Some(last)) = (snapshot.daily.first(), snapshot.daily.last()) {
        println!("   First day seen: {} | Last day seen: {}", first.label, last.label);
    }

    println!("\n✅ Dry run complete.");
    strict_exit_code(strict, snapshot.skipped_records)
}

fn strict_exit_code(strict: bool, skipped: usize) -> i32 {
    if strict && skipped > 0 {
        eprintln!(
            "\n⛔ {} scans were skipped. Failing (exit code 2).",
            skipped
        );
        2
    } else {
        0
    }
}

/// The instant used for "today": `--now` if given, otherwise the clock.
fn resolve_now(args: &Args, aggregator: &Aggregator) -> Result<DateTime<FixedOffset>> {
    match args.now {
        Some(ref value) => {
            let tz = aggregator.config().utc_offset;
            let now = timestamp::parse_timestamp(value, "--now", &tz)
                .with_context(|| format!("Invalid --now value: {}", value))?;
            debug!("Using fixed now: {}", now);
            Ok(now)
        }
        None => Ok(aggregator.now()),
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
