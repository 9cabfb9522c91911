//! CSV export of processing results
//!
//! One header row, then one row per result in the order given:
//!
//! ```text
//! Identifier,StatusCode,ElapsedTimeMs,GateWaitTimeMs,CrawlTimestamp,DiscoveredCount,SequenceId,Depth,DiscoveredFrom
//! ```
//!
//! Output depends only on the results, so exporting the same snapshot twice
//! yields byte-identical files.

use crate::traversal::{ProcessingResult, StatusCode};
use chrono::SecondsFormat;
use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Header row, in column order
pub const CSV_HEADER: [&str; 9] = [
    "Identifier",
    "StatusCode",
    "ElapsedTimeMs",
    "GateWaitTimeMs",
    "CrawlTimestamp",
    "DiscoveredCount",
    "SequenceId",
    "Depth",
    "DiscoveredFrom",
];

/// Quotes a field if it contains a delimiter, quote or line break
fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains(|c: char| matches!(c, ',' | '"' | '\n' | '\r')) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

fn write_row<W: Write>(writer: &mut W, fields: &[&str]) -> io::Result<()> {
    let line = fields
        .iter()
        .map(|field| escape_field(field))
        .collect::<Vec<_>>()
        .join(",");
    writeln!(writer, "{}", line)
}

/// Writes the header and one row per result
pub fn write_csv<W, T>(writer: &mut W, results: &[ProcessingResult<T>]) -> io::Result<()>
where
    W: Write,
    T: StatusCode,
{
    write_row(writer, &CSV_HEADER)?;

    for result in results {
        let status = result.status_label();
        let elapsed = result.elapsed.as_millis().to_string();
        let gate_wait = result.gate_wait.as_millis().to_string();
        let timestamp = result
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let discovered = result.discovered.len().to_string();
        let sequence_id = result.item.sequence_id.to_string();
        let depth = result.item.depth.to_string();

        write_row(
            writer,
            &[
                result.item.identifier.as_str(),
                status.as_str(),
                elapsed.as_str(),
                gate_wait.as_str(),
                timestamp.as_str(),
                discovered.as_str(),
                sequence_id.as_str(),
                depth.as_str(),
                result.item.discovered_from.as_deref().unwrap_or(""),
            ],
        )?;
    }

    Ok(())
}

/// Exports results to a CSV file, replacing any existing file
pub fn export_csv<T: StatusCode>(path: &Path, results: &[ProcessingResult<T>]) -> io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_csv(&mut writer, results)?;
    writer.flush()?;
    tracing::info!(
        "Exported {} results to {}",
        results.len(),
        path.display()
    );
    Ok(())
}
