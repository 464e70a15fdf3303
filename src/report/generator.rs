//! Markdown report generation.
//!
//! This module renders the dashboard snapshot (and optionally the
//! attendance records table) as a Markdown or JSON report.

use crate::models::{
    DailyCount, DelayBucket, FrequencyEntry, PunctualitySplit, RecordRow, RecurrenceSplit,
    Report, ReportMetadata, Summary, TodayScan,
};
use anyhow::Result;

/// Width of the longest bar in the delay distribution.
const BAR_WIDTH: usize = 20;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &Report) -> String {
    let snapshot = &report.snapshot;
    let mut output = String::new();

    output.push_str("# Latecomers Analytics Report\n\n");

    output.push_str(&generate_metadata_section(&report.metadata));
    output.push_str(&generate_summary_section(&snapshot.summary));
    output.push_str(&generate_delay_section(&snapshot.delay_distribution));
    output.push_str(&generate_daily_section(&snapshot.daily));
    output.push_str(&generate_frequent_section(&snapshot.frequent));
    output.push_str(&generate_today_section(&snapshot.today));
    output.push_str(&generate_split_section(
        &snapshot.punctuality,
        &snapshot.recurrence,
    ));

    if let Some(ref rows) = report.records {
        output.push_str(&generate_records_section(rows, report.records_date));
    }

    output.push_str(&generate_footer());

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Source:** `{}`\n", metadata.source));
    section.push_str(&format!(
        "- **Generated At:** {}\n",
        metadata.generated_at.format("%Y-%m-%d %H:%M:%S %:z")
    ));
    section.push_str(&format!(
        "- **Cutoff:** {} (UTC{})\n",
        metadata.cutoff, metadata.utc_offset
    ));
    section.push_str(&format!(
        "- **Scans Parsed:** {}\n",
        metadata.records_parsed
    ));
    if metadata.records_skipped > 0 {
        section.push_str(&format!(
            "- **Scans Skipped:** {} (unreadable timestamp)\n",
            metadata.records_skipped
        ));
    }
    section.push('\n');

    section
}

/// Generate the headline numbers.
fn generate_summary_section(summary: &Summary) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(
        "| Total Latecomers | Repeat Offenders | Avg. Delay (mins) | Today's Latecomers |\n",
    );
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        summary.total_latecomers,
        summary.repeat_offenders,
        summary.average_delay,
        summary.todays_latecomers
    ));
    section.push_str("*Totals include every scan, including those before the cutoff.*\n\n");

    section
}

/// Generate the delay distribution table with a text bar per range.
fn generate_delay_section(buckets: &[DelayBucket]) -> String {
    let mut section = String::new();

    section.push_str("## Delay Distribution\n\n");
    section.push_str("| Minutes Late | Scans | Share | |\n");
    section.push_str("|:---|:---:|---:|:---|\n");

    let max = buckets.iter().map(|b| b.count).max().unwrap_or(0);
    for bucket in buckets {
        section.push_str(&format!(
            "| {} | {} | {:.1}% | {} |\n",
            bucket.label,
            bucket.count,
            bucket.percentage,
            bar(bucket.count, max)
        ));
    }
    section.push('\n');

    section
}

fn bar(count: usize, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    "█".repeat((count * BAR_WIDTH + max - 1) / max)
}

/// Generate the per-day counts.
fn generate_daily_section(daily: &[DailyCount]) -> String {
    let mut section = String::new();

    section.push_str("## Latecomers by Day\n\n");

    if daily.is_empty() {
        section.push_str("No scans recorded.\n\n");
        return section;
    }

    section.push_str("| Date | Scans |\n");
    section.push_str("|:---|:---:|\n");
    for day in daily {
        section.push_str(&format!("| {} | {} |\n", day.label, day.count));
    }
    section.push('\n');

    section
}

/// Generate the frequent latecomer ranking.
fn generate_frequent_section(frequent: &[FrequencyEntry]) -> String {
    let mut section = String::new();

    section.push_str("## Frequent Latecomers\n\n");

    if frequent.is_empty() {
        section.push_str("No scans recorded.\n\n");
        return section;
    }

    section.push_str("| # | Roll Number | Times Late |\n");
    section.push_str("|:---:|:---|:---:|\n");
    for (i, entry) in frequent.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            i + 1,
            entry.roll_number,
            entry.count
        ));
    }
    section.push('\n');

    section
}

/// Generate today's scans.
fn generate_today_section(today: &[TodayScan]) -> String {
    let mut section = String::new();

    section.push_str("## Today's Latecomers\n\n");

    if today.is_empty() {
        section.push_str("No scans today.\n\n");
        return section;
    }

    section.push_str("| Roll Number | Time |\n");
    section.push_str("|:---|:---:|\n");
    for scan in today {
        section.push_str(&format!("| {} | {} |\n", scan.roll_number, scan.time));
    }
    section.push('\n');

    section
}

/// Generate the punctuality and recurrence splits.
fn generate_split_section(punctuality: &PunctualitySplit, recurrence: &RecurrenceSplit) -> String {
    let mut section = String::new();

    section.push_str("## Breakdown\n\n");
    section.push_str("| | Count |\n");
    section.push_str("|:---|:---:|\n");
    section.push_str(&format!("| On time | {} |\n", punctuality.on_time));
    section.push_str(&format!("| Late | {} |\n", punctuality.late));
    section.push_str(&format!("| First-time students | {} |\n", recurrence.first_time));
    section.push_str(&format!("| Repeat students | {} |\n", recurrence.repeat));
    section.push('\n');

    section
}

/// Generate the attendance records table.
fn generate_records_section(rows: &[RecordRow], date: Option<chrono::NaiveDate>) -> String {
    let mut section = String::new();

    section.push_str("## Attendance Records\n\n");
    if let Some(date) = date {
        section.push_str(&format!("*Showing {}*\n\n", date.format("%Y-%m-%d")));
    }

    section.push_str("| Roll Number | Date | Time |\n");
    section.push_str("|:---:|:---:|:---:|\n");

    if rows.is_empty() {
        section.push_str("| No records found | | |\n");
    }
    for row in rows {
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            row.roll_number, row.date, row.time
        ));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Report generated by latecomers v{}*\n",
        env!("CARGO_PKG_VERSION")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
