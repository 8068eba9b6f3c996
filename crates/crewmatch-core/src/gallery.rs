//! Reference images, one per roster identity, used as the source side of
//! pairwise comparison.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct SourceGallery {
    images: HashMap<String, PathBuf>,
}

impl SourceGallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the reference image for `name`, replacing any previous one.
    pub fn insert(&mut self, name: impl Into<String>, path: impl Into<PathBuf>) {
        self.images.insert(name.into(), path.into());
    }

    pub fn get(&self, name: &str) -> Option<&Path> {
        self.images.get(name).map(PathBuf::as_path)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.images.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}
