//! Presence history: per-identity windows during which that identity is
//! known to have been co-located with others.

use chrono::NaiveDateTime;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TimelineError {
    #[error("presence interval for {name} ends ({end}) before it starts ({start})")]
    Inverted {
        name: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

/// A presence window. `end >= start` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PresenceInterval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl PresenceInterval {
    /// Returns `None` when `end < start`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Option<Self> {
        (end >= start).then_some(Self { start, end })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Closed overlap test: `a.start <= b.end && b.start <= a.end`.
    /// Symmetric, and windows that only touch at an endpoint overlap.
    pub fn overlaps(&self, other: &PresenceInterval) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

/// Presence windows keyed by canonical roster name.
#[derive(Debug, Clone, Default)]
pub struct PresenceTimeline {
    windows: HashMap<String, Vec<PresenceInterval>>,
}

impl PresenceTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a window for `name`, keeping that identity's windows sorted by start.
    pub fn insert(&mut self, name: impl Into<String>, interval: PresenceInterval) {
        let windows = self.windows.entry(name.into()).or_default();
        let at = windows.partition_point(|w| w <= &interval);
        windows.insert(at, interval);
    }

    /// Validate and insert a raw `(start, end)` pair.
    pub fn insert_range(
        &mut self,
        name: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<(), TimelineError> {
        let interval = PresenceInterval::new(start, end).ok_or_else(|| TimelineError::Inverted {
            name: name.to_string(),
            start,
            end,
        })?;
        self.insert(name, interval);
        Ok(())
    }

    pub fn windows_of(&self, name: &str) -> &[PresenceInterval] {
        self.windows.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True if any window of `a` overlaps any window of `b`.
    pub fn co_present(&self, a: &str, b: &str) -> bool {
        let wb = self.windows_of(b);
        self.windows_of(a)
            .iter()
            .any(|x| wb.iter().any(|y| x.overlaps(y)))
    }

    /// Number of identities with at least one window.
    pub fn identity_count(&self) -> usize {
        self.windows.len()
    }

    pub fn interval_count(&self) -> usize {
        self.windows.values().map(Vec::len).sum()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.windows.keys().map(String::as_str)
    }
}
