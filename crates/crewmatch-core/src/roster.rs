//! The fixed roster of identities eligible to be matched.
//!
//! Iteration order is load order. Name resolution and the comparison
//! stage both depend on it, so it is never re-sorted.

use std::collections::HashMap;
use thiserror::Error;

use crate::types::{Gender, Identity};

#[derive(Error, Debug)]
pub enum RosterError {
    #[error("duplicate roster entry: {0}")]
    DuplicateName(String),
    #[error("roster entry has an empty name")]
    EmptyName,
    #[error("roster name {name:?} contains reserved character {character:?}")]
    ReservedCharacter { name: String, character: char },
}

/// Separators of the match and pair record formats; canonical names must
/// not contain them.
pub const RESERVED_NAME_CHARS: &[char] = &[',', '|'];

/// Immutable, ordered identity table keyed by canonical name.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: Vec<Identity>,
    index: HashMap<String, usize>,
}

impl Roster {
    pub fn new(entries: Vec<Identity>) -> Result<Self, RosterError> {
        let mut index = HashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if entry.name.trim().is_empty() {
                return Err(RosterError::EmptyName);
            }
            if let Some(character) = entry.name.chars().find(|c| RESERVED_NAME_CHARS.contains(c)) {
                return Err(RosterError::ReservedCharacter {
                    name: entry.name.clone(),
                    character,
                });
            }
            if index.insert(entry.name.clone(), i).is_some() {
                return Err(RosterError::DuplicateName(entry.name.clone()));
            }
        }
        Ok(Self { entries, index })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Identity> {
        self.entries.iter()
    }

    pub fn get(&self, position: usize) -> Option<&Identity> {
        self.entries.get(position)
    }

    /// Position of a canonical name in roster order.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn find(&self, name: &str) -> Option<&Identity> {
        self.position(name).map(|i| &self.entries[i])
    }

    pub fn agency_of(&self, name: &str) -> Option<&str> {
        self.find(name).map(|id| id.agency.as_str())
    }

    /// Number of entries per gender, for diagnostics.
    pub fn gender_counts(&self) -> [(Gender, usize); 3] {
        let count = |g: Gender| self.entries.iter().filter(|e| e.gender == g).count();
        [
            (Gender::Male, count(Gender::Male)),
            (Gender::Female, count(Gender::Female)),
            (Gender::Unknown, count(Gender::Unknown)),
        ]
    }
}
