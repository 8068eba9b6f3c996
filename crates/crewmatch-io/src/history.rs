//! Presence-history table loader.
//!
//! One row per presence window: `name`, `in` (or `start`), `out` (or `end`).
//! Instants are `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`.

use chrono::{NaiveDate, NaiveDateTime};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crewmatch_core::{PresenceTimeline, Roster};

use crate::error::LoadError;
use crate::roster::find_column;

const NAME_COLUMNS: &[&str] = &["name"];
const START_COLUMNS: &[&str] = &["in", "start"];
const END_COLUMNS: &[&str] = &["out", "end"];

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Load the history table. When `roster` is given, names missing from it are
/// kept but reported, since they can never become candidates.
pub fn load_timeline(path: &Path, roster: Option<&Roster>) -> Result<PresenceTimeline, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let timeline = read_timeline(file)?;

    if let Some(roster) = roster {
        for name in timeline.names().filter(|n| roster.find(n).is_none()) {
            tracing::warn!(name, "presence history names someone not on the roster");
        }
    }
    tracing::info!(
        path = %path.display(),
        identities = timeline.identity_count(),
        intervals = timeline.interval_count(),
        "presence history loaded"
    );
    Ok(timeline)
}

pub fn read_timeline<R: Read>(reader: R) -> Result<PresenceTimeline, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let name_col = find_column(&headers, "name", NAME_COLUMNS)?;
    let start_col = find_column(&headers, "in", START_COLUMNS)?;
    let end_col = find_column(&headers, "out", END_COLUMNS)?;

    let mut timeline = PresenceTimeline::new();
    for (idx, row) in rdr.records().enumerate() {
        let row = row?;
        let line = row.position().map_or(idx + 2, |p| p.line() as usize);
        let name = row.get(name_col).unwrap_or("");
        let start = instant(row.get(start_col).unwrap_or(""), line)?;
        let end = instant(row.get(end_col).unwrap_or(""), line)?;
        timeline
            .insert_range(name, start, end)
            .map_err(|source| LoadError::Timeline { row: line, source })?;
    }
    Ok(timeline)
}

fn instant(value: &str, row: usize) -> Result<NaiveDateTime, LoadError> {
    parse_instant(value).ok_or_else(|| LoadError::InvalidInstant {
        row,
        value: value.to_string(),
    })
}

/// Parse a date or date-time. Bare dates are taken at midnight.
pub fn parse_instant(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(value, f).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|f| NaiveDate::parse_from_str(value, f).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
