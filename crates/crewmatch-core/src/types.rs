use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::vision::FaceDetail;

/// Gender attribute shared by roster entries and detected faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Gender {
    /// Parse a free-form label. Anything other than male/female is `Unknown`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Gender::Male,
            "female" | "f" => Gender::Female,
            _ => Gender::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A roster entry. The canonical name is the unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub gender: Gender,
    pub agency: String,
    /// Remaining roster columns (alternate spellings, nationality, ...).
    /// They take part in name resolution but are otherwise opaque.
    #[serde(default)]
    pub extra: Vec<String>,
}

impl Identity {
    pub fn new(name: impl Into<String>, gender: Gender, agency: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            gender,
            agency: agency.into(),
            extra: Vec::new(),
        }
    }

    pub fn with_extra(mut self, extra: Vec<String>) -> Self {
        self.extra = extra;
        self
    }

    /// All fields joined by `,`, the text that raw recognition names are
    /// searched against.
    pub fn search_text(&self) -> String {
        let mut fields: Vec<&str> = vec![&self.name, self.gender.as_str(), &self.agency];
        fields.extend(self.extra.iter().map(String::as_str));
        fields.join(",")
    }
}

/// An image to resolve: stable id plus the file the vision service reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub id: String,
    pub path: PathBuf,
}

impl ImageRef {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
        }
    }
}

/// One face found by the detector, with its gender label already gated
/// on detector confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedFace {
    pub gender: Gender,
    pub roll: f32,
    pub yaw: f32,
    pub pitch: f32,
}

impl DetectedFace {
    /// Keep the reported gender only when confidence (percent) is strictly
    /// above `min_confidence`.
    pub fn from_detail(detail: &FaceDetail, min_confidence: f32) -> Self {
        let gender = if detail.gender_confidence > min_confidence {
            detail.gender
        } else {
            Gender::Unknown
        };
        Self {
            gender,
            roll: detail.roll,
            yaw: detail.yaw,
            pitch: detail.pitch,
        }
    }
}

/// Per-image result: canonical names in the order they were resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub image_id: String,
    pub names: Vec<String>,
}

impl MatchRecord {
    pub fn new(image_id: impl Into<String>) -> Self {
        Self {
            image_id: image_id.into(),
            names: Vec::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn push(&mut self, name: impl Into<String>) {
        self.names.push(name.into());
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Co-occurrence edge between two identities matched in the same image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairRecord {
    pub name_a: String,
    pub name_b: String,
    pub agency_a: String,
    pub agency_b: String,
}
