use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing column {column:?} (expected one of {candidates:?})")]
    MissingColumn {
        column: &'static str,
        candidates: &'static [&'static str],
    },
    #[error("row {row}: cannot parse instant {value:?} (expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS)")]
    InvalidInstant { row: usize, value: String },
    #[error("row {row}: {source}")]
    Timeline {
        row: usize,
        #[source]
        source: crewmatch_core::TimelineError,
    },
    #[error("roster: {0}")]
    Roster(#[from] crewmatch_core::RosterError),
    #[error("line {line}: malformed match record {text:?}")]
    MalformedMatch { line: usize, text: String },
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),
}
