//! Boundary to the external vision service.
//!
//! Detection, celebrity-style recognition and pairwise face comparison are
//! remote, rate-limited and opaque. Implementations block for the duration
//! of one request and must be shareable across worker threads.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::Gender;

/// Minimum face similarity (percent) for a pairwise comparison to count.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 80.0;

#[derive(Error, Debug)]
pub enum VisionError {
    #[error("cannot read image {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("vision service request failed: {0}")]
    Transport(String),
    #[error("unusable vision service response: {0}")]
    Response(String),
}

/// Raw per-face attributes as reported by the detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceDetail {
    pub gender: Gender,
    /// Detector confidence in `gender`, percent.
    pub gender_confidence: f32,
    pub roll: f32,
    pub yaw: f32,
    pub pitch: f32,
}

/// The three vision operations the resolution pipeline consumes.
pub trait VisionService: Send + Sync {
    /// Detect every face in `image`. An error skips the image.
    fn detect_faces(&self, image: &Path) -> Result<Vec<FaceDetail>, VisionError>;

    /// Names of recognized public figures in `image`, possibly misspelled.
    fn recognize_names(&self, image: &Path) -> Result<Vec<String>, VisionError>;

    /// Number of faces in `target` matching the face in `source` at or above
    /// `similarity_threshold` percent.
    fn compare_faces(
        &self,
        source: &Path,
        target: &Path,
        similarity_threshold: f32,
    ) -> Result<usize, VisionError>;
}
