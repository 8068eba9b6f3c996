//! `pairs.txt`: one co-occurrence per line, `nameA,nameB,agencyA,agencyB`.
//! No header row; fields containing a comma or quote are CSV-quoted.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crewmatch_core::PairRecord;

use crate::error::LoadError;

/// Write every pair, returning how many were written.
pub fn write_pairs<W: Write>(
    writer: &mut W,
    pairs: impl IntoIterator<Item = PairRecord>,
) -> Result<usize, LoadError> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    let mut written = 0;
    for pair in pairs {
        wtr.write_record([&pair.name_a, &pair.name_b, &pair.agency_a, &pair.agency_b])?;
        written += 1;
    }
    wtr.flush()?;
    Ok(written)
}

/// Replace `path` with the given pairs.
pub fn save_pairs(
    path: &Path,
    pairs: impl IntoIterator<Item = PairRecord>,
) -> Result<usize, LoadError> {
    let file = File::create(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let written = write_pairs(&mut BufWriter::new(file), pairs)?;
    tracing::info!(path = %path.display(), pairs = written, "pairs written");
    Ok(written)
}
