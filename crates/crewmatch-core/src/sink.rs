//! Output boundary for finalized match records.

use std::sync::{Mutex, PoisonError};
use thiserror::Error;

use crate::types::MatchRecord;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sink lock poisoned")]
    Poisoned,
}

/// Append-only record stream. Shared by every worker of a corpus run, so
/// appends take `&self` and must be safe to call concurrently.
pub trait MatchSink: Send + Sync {
    fn append(&self, record: &MatchRecord) -> Result<(), SinkError>;
}

/// In-memory sink, used for tests and for generating pairs in-process.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<MatchRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything appended so far. Records pushed before a
    /// panicking writer poisoned the lock are still returned.
    pub fn records(&self) -> Vec<MatchRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn into_records(self) -> Vec<MatchRecord> {
        self.records
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl MatchSink for MemorySink {
    fn append(&self, record: &MatchRecord) -> Result<(), SinkError> {
        self.records
            .lock()
            .map_err(|_| SinkError::Poisoned)?
            .push(record.clone());
        Ok(())
    }
}
