//! Co-occurrence pairs derived from finalized match records.
//!
//! Every image with two or more matched names contributes each unordered
//! 2-combination of its names once. Pairs are not deduplicated across
//! images: multiplicity is how often two people were photographed together.

use crate::roster::Roster;
use crate::types::{MatchRecord, PairRecord};

pub struct PairEmitter<'a> {
    roster: &'a Roster,
}

impl<'a> PairEmitter<'a> {
    pub fn new(roster: &'a Roster) -> Self {
        Self { roster }
    }

    /// Lazily generate pairs over `records`. Calling again restarts from the
    /// beginning and yields the identical sequence.
    pub fn emit<'r>(&self, records: &'r [MatchRecord]) -> Pairs<'r, 'a> {
        Pairs {
            roster: self.roster,
            records,
            record: 0,
            i: 0,
            j: 1,
        }
    }
}

/// Iterator over pairs in record order, then `(i, j)` with `i < j` in
/// name-list order.
#[derive(Clone)]
pub struct Pairs<'r, 'a> {
    roster: &'a Roster,
    records: &'r [MatchRecord],
    record: usize,
    i: usize,
    j: usize,
}

impl Pairs<'_, '_> {
    fn agency(&self, name: &str) -> String {
        match self.roster.agency_of(name) {
            Some(agency) => agency.to_string(),
            None => {
                tracing::warn!(name, "matched name missing from roster; agency left blank");
                String::new()
            }
        }
    }
}

impl Iterator for Pairs<'_, '_> {
    type Item = PairRecord;

    fn next(&mut self) -> Option<PairRecord> {
        while let Some(record) = self.records.get(self.record) {
            let names = &record.names;
            if self.j >= names.len() {
                self.i += 1;
                self.j = self.i + 1;
            }
            if self.i + 1 >= names.len() {
                self.record += 1;
                self.i = 0;
                self.j = 1;
                continue;
            }

            let (a, b) = (&names[self.i], &names[self.j]);
            self.j += 1;
            return Some(PairRecord {
                name_a: a.clone(),
                name_b: b.clone(),
                agency_a: self.agency(a),
                agency_b: self.agency(b),
            });
        }
        None
    }
}
