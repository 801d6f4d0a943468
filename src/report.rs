//! Writes scan records to an output stream.
use clap::ValueEnum;
use std::io::Write;

use crate::{error::Result, record::PackageRecord};

const UNKNOWN: &str = "Unknown";

/// Output format for records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per package.
    #[default]
    Text,
    /// Pretty-printed JSON array.
    Json,
}

/// Sorts records by package name, then host. Stable.
pub fn sort_records(records: &mut [PackageRecord]) {
    records.sort_by(|a, b| {
        a.name
            .cmp(&b.name)
            .then_with(|| a.host.name().cmp(b.host.name()))
    });
}

/// Formats a record as a single text line.
pub fn format_line(record: &PackageRecord) -> String {
    let date = record
        .commit_date
        .map(|d| d.format("%Y-%m-%d").to_string());

    format!(
        "[{}] Package: {}, Version: {}, Commit: {}, Date: {}, Snapshot: {}",
        record.host,
        record.name,
        record.version,
        record.short_hash().unwrap_or(UNKNOWN),
        date.as_deref().unwrap_or(UNKNOWN),
        record.snapshot().as_deref().unwrap_or(UNKNOWN),
    )
}

/// Writes `records` in the given order.
pub fn write_records<W: Write>(
    writer: &mut W,
    records: &[PackageRecord],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for record in records {
                writeln!(writer, "{}", format_line(record))?;
            }
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, records)?;
            writeln!(writer)?;
        }
    }

    writer.flush()?;

    Ok(())
}
