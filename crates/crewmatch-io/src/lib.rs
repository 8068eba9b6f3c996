//! crewmatch-io — Flat-file inputs and outputs around the resolution core.
//!
//! Loads the roster and presence-history CSV tables, scans the reference
//! gallery and image corpus directories, and reads/writes the `matches.txt`
//! and `pairs.txt` formats.

pub mod error;
pub mod history;
pub mod images;
pub mod matches;
pub mod pairs;
pub mod roster;

pub use error::LoadError;
pub use history::{load_timeline, read_timeline};
pub use images::{scan_corpus, scan_gallery};
pub use matches::{read_matches, MatchFileSink};
pub use pairs::{save_pairs, write_pairs};
pub use roster::{load_roster, read_roster};
