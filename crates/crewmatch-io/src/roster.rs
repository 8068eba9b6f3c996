//! Roster table loader.
//!
//! The header row is required. `name`, `gender` and `agency` are located
//! by header (case-insensitive); every other column is kept as an extra
//! field so alternate spellings take part in name resolution.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crewmatch_core::{Gender, Identity, Roster};

use crate::error::LoadError;

const NAME_COLUMNS: &[&str] = &["name"];
const GENDER_COLUMNS: &[&str] = &["gender", "sex"];
const AGENCY_COLUMNS: &[&str] = &["agency"];

pub fn load_roster(path: &Path) -> Result<Roster, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let roster = read_roster(file)?;
    tracing::info!(path = %path.display(), entries = roster.len(), "roster loaded");
    Ok(roster)
}

pub fn read_roster<R: Read>(reader: R) -> Result<Roster, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.clone();
    let name_col = find_column(&headers, "name", NAME_COLUMNS)?;
    let gender_col = find_column(&headers, "gender", GENDER_COLUMNS)?;
    let agency_col = find_column(&headers, "agency", AGENCY_COLUMNS)?;

    let mut entries = Vec::new();
    for row in rdr.records() {
        let row = row?;
        let field = |i: usize| row.get(i).unwrap_or("").to_string();
        let extra = row
            .iter()
            .enumerate()
            .filter(|(i, _)| ![name_col, gender_col, agency_col].contains(i))
            .map(|(_, v)| v.to_string())
            .collect();

        entries.push(
            Identity::new(field(name_col), Gender::parse(&field(gender_col)), field(agency_col))
                .with_extra(extra),
        );
    }

    Ok(Roster::new(entries)?)
}

/// Index of the first header matching any of `candidates`, ignoring case.
pub(crate) fn find_column(
    headers: &csv::StringRecord,
    column: &'static str,
    candidates: &'static [&'static str],
) -> Result<usize, LoadError> {
    headers
        .iter()
        .position(|h| candidates.iter().any(|c| h.trim().eq_ignore_ascii_case(c)))
        .ok_or(LoadError::MissingColumn { column, candidates })
}
