//! Participant export in CSV or JSON form.

use chrono::SecondsFormat;
use serde::Serialize;

use crate::models::{Event, Participant};
use crate::{Error, Result};

pub const CSV_HEADER: &str = "Event ID,Title,Name,Email,Message,Timestamp";

/// Requested export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// `csv` selects CSV; anything else, including nothing, is JSON.
    pub fn from_query(fmt: Option<&str>) -> Self {
        match fmt {
            Some(f) if f.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
            _ => ExportFormat::Json,
        }
    }
}

/// JSON export document.
#[derive(Debug, Serialize)]
pub struct JsonExport<'a> {
    pub event_id: &'a str,
    pub title: &'a str,
    pub participants: &'a [Participant],
}

pub fn to_json(event: &Event) -> JsonExport<'_> {
    JsonExport {
        event_id: &event.id,
        title: &event.title,
        participants: &event.participants,
    }
}

/// Render the header line plus one fully quoted row per participant.
///
/// Rows are separated by `\n` and the last row has no terminator.
pub fn to_csv(event: &Event) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for p in &event.participants {
        let timestamp = p.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
        writer.write_record([
            event.id.as_str(),
            event.title.as_str(),
            p.name.as_str(),
            p.email.as_str(),
            p.message.as_deref().unwrap_or(""),
            timestamp.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| Error::Internal(format!("Failed to flush CSV: {}", e)))?;
    let rows = String::from_utf8(bytes)
        .map_err(|e| Error::Internal(format!("CSV output is not UTF-8: {}", e)))?;
    let rows = rows.strip_suffix('\n').unwrap_or(&rows);

    Ok(format!("{}\n{}", CSV_HEADER, rows))
}

/// File name offered for a CSV download.
pub fn csv_filename(event_id: &str) -> String {
    format!("event_{}.csv", event_id)
}
