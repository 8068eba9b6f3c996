//! `matches.txt`: one line per processed image, `image_id|name1,name2,...`.
//!
//! Roster names never contain `,` or `|`, so the last `|` on a line always
//! ends the image id, even when the id itself contains one.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;

use crewmatch_core::{MatchRecord, MatchSink, SinkError};

use crate::error::LoadError;

pub fn format_record(record: &MatchRecord) -> String {
    format!("{}|{}", record.image_id, record.names.join(","))
}

pub fn parse_record(line: &str) -> Option<MatchRecord> {
    let (id, names) = line.rsplit_once('|')?;
    Some(MatchRecord {
        image_id: id.trim().to_string(),
        names: names
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
            .collect(),
    })
}

/// Read every record back, in file order. Blank lines are ignored.
pub fn read_matches(path: &Path) -> Result<Vec<MatchRecord>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut records = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record = parse_record(&line).ok_or_else(|| LoadError::MalformedMatch {
            line: idx + 1,
            text: line.clone(),
        })?;
        records.push(record);
    }
    tracing::debug!(path = %path.display(), records = records.len(), "match records read");
    Ok(records)
}

/// File-backed [`MatchSink`]. Each record is flushed as soon as it is
/// appended so a crash loses at most the image in flight.
pub struct MatchFileSink {
    writer: Mutex<BufWriter<File>>,
}

impl MatchFileSink {
    /// Start a fresh file, truncating any previous run.
    pub fn create(path: &Path) -> Result<Self, LoadError> {
        Self::open(path, false)
    }

    /// Append to an existing file, creating it if needed.
    pub fn open_append(path: &Path) -> Result<Self, LoadError> {
        Self::open(path, true)
    }

    fn open(path: &Path, append: bool) -> Result<Self, LoadError> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)
            .map_err(|source| LoadError::Open {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
        })
    }
}

impl MatchSink for MatchFileSink {
    fn append(&self, record: &MatchRecord) -> Result<(), SinkError> {
        let mut writer = self.writer.lock().map_err(|_| SinkError::Poisoned)?;
        writeln!(writer, "{}", format_record(record))?;
        writer.flush()?;
        Ok(())
    }
}
