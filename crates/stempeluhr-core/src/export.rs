//! CSV export of tracking entries.
//!
//! Format: semicolon-delimited, UTF-8 with a leading BOM (Excel needs it to
//! pick the right encoding), German header and weekday names, decimal hours
//! with two fraction digits and a dot separator regardless of locale.
//! Fields are escaped per RFC 4180.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::{ExportError, Result};
use crate::model::{EntryWithPauses, TrackingType};
use crate::storage::TrackingRepository;

const UTF8_BOM: &str = "\u{feff}";
const SEPARATOR: char = ';';
const HEADER: &str = "Datum;Wochentag;Typ;Startzeit;Endzeit;Brutto (h);Pausen (h);Netto (h);Notiz";

/// Renders tracking entries to CSV documents.
pub struct CsvExporter {
    repository: Arc<dyn TrackingRepository>,
}

impl CsvExporter {
    pub fn new(repository: Arc<dyn TrackingRepository>) -> Self {
        Self { repository }
    }

    /// Renders all completed entries with dates in `[start, end]` to a CSV
    /// document, sorted by date. Entries still running are left out.
    pub fn render(&self, start: NaiveDate, end: NaiveDate) -> Result<String> {
        let entries = self.repository.entries_in_range(start, end)?;

        let mut completed: Vec<&EntryWithPauses> = entries
            .iter()
            .filter(|e| e.entry.end_time.is_some())
            .collect();
        completed.sort_by_key(|e| e.entry.date);

        let mut doc = String::from(UTF8_BOM);
        doc.push_str(HEADER);
        doc.push('\n');
        for entry in completed {
            doc.push_str(&format_row(entry));
            doc.push('\n');
        }
        Ok(doc)
    }

    /// Renders and writes `arbeitszeit_{start}_{end}.csv` into `dir`.
    ///
    /// The document is written to a temporary file and published by rename,
    /// so a failed export never leaves a partial file under the final name.
    pub fn export_to_dir(&self, dir: &Path, start: NaiveDate, end: NaiveDate) -> Result<PathBuf> {
        if !dir.is_dir() {
            return Err(ExportError::NotADirectory {
                path: dir.to_path_buf(),
            }
            .into());
        }

        let document = self.render(start, end)?;
        let filename = format!("arbeitszeit_{start}_{end}.csv");
        let path = dir.join(&filename);
        let tmp = dir.join(format!(".{filename}.tmp"));

        fs::write(&tmp, document.as_bytes()).map_err(|source| ExportError::WriteFailed {
            path: tmp.clone(),
            source,
        })?;
        if let Err(source) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(ExportError::WriteFailed { path, source }.into());
        }

        log::info!("exported {} to {}", filename, dir.display());
        Ok(path)
    }
}

fn format_row(entry: &EntryWithPauses) -> String {
    let e = &entry.entry;
    // only completed entries reach this point
    let end_time = e.end_time.unwrap_or(e.start_time);

    let gross_minutes = (end_time - e.start_time).num_minutes();
    let pause_minutes = entry.closed_pause_minutes();
    let net_minutes = gross_minutes - pause_minutes;

    let fields = [
        e.date.to_string(),
        weekday_name_de(e.date.weekday()).to_string(),
        format_type(e.kind).to_string(),
        e.start_time.format("%H:%M").to_string(),
        end_time.format("%H:%M").to_string(),
        format_decimal_hours(gross_minutes),
        format_decimal_hours(pause_minutes),
        format_decimal_hours(net_minutes),
        e.notes.clone().unwrap_or_default(),
    ];
    fields
        .iter()
        .map(|f| escape_csv_field(f))
        .collect::<Vec<_>>()
        .join(";")
}

fn format_type(kind: TrackingType) -> &'static str {
    match kind {
        TrackingType::CommuteOffice => "Büro (Pendel)",
        TrackingType::HomeOffice => "Home Office",
        TrackingType::Manual => "Manuell",
    }
}

fn weekday_name_de(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Montag",
        Weekday::Tue => "Dienstag",
        Weekday::Wed => "Mittwoch",
        Weekday::Thu => "Donnerstag",
        Weekday::Fri => "Freitag",
        Weekday::Sat => "Samstag",
        Weekday::Sun => "Sonntag",
    }
}

/// Minutes as decimal hours with exactly two fraction digits, dot separator.
fn format_decimal_hours(minutes: i64) -> String {
    format!("{:.2}", minutes as f64 / 60.0)
}

/// Escapes one field per RFC 4180: quoted when it contains the delimiter, a
/// quote, or a line break, with inner quotes doubled.
fn escape_csv_field(field: &str) -> String {
    let needs_quoting =
        field.contains(SEPARATOR) || field.contains('"') || field.contains('\n') || field.contains('\r');
    if !needs_quoting {
        return field.to_string();
    }
    format!("\"{}\"", field.replace('"', "\"\""))
}
