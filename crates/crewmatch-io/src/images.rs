//! Image directory scanning for the reference gallery and the corpus.

use std::fs;
use std::path::{Path, PathBuf};

use crewmatch_core::{ImageRef, Roster, SourceGallery};

use crate::error::LoadError;

/// Regular files in `dir`, sorted by file name. Hidden files are ignored.
fn list_files(dir: &Path) -> Result<Vec<PathBuf>, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::NotADirectory(dir.to_path_buf()));
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(|source| LoadError::Open {
        path: dir.to_path_buf(),
        source,
    })? {
        let entry = entry?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if entry.file_type()?.is_file() && !hidden {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn stem(path: &Path) -> Option<String> {
    path.file_stem().map(|s| s.to_string_lossy().into_owned())
}

/// Reference images named after identities, `First_Last.jpg` for
/// `First Last`. With a roster, images for unknown names are reported and
/// identities without an image are counted.
pub fn scan_gallery(dir: &Path, roster: Option<&Roster>) -> Result<SourceGallery, LoadError> {
    let mut gallery = SourceGallery::new();
    for path in list_files(dir)? {
        let Some(stem) = stem(&path) else { continue };
        let name = stem.replace('_', " ");
        if roster.is_some_and(|r| r.find(&name).is_none()) {
            tracing::warn!(file = %path.display(), name, "reference image for someone not on the roster");
        }
        gallery.insert(name, path);
    }

    if let Some(roster) = roster {
        let missing = roster.iter().filter(|id| !gallery.contains(&id.name)).count();
        if missing > 0 {
            tracing::warn!(missing, "roster identities without a reference image cannot be compared");
        }
    }
    tracing::info!(dir = %dir.display(), images = gallery.len(), "reference gallery scanned");
    Ok(gallery)
}

/// Every file in the corpus directory; the image id is the file stem.
pub fn scan_corpus(dir: &Path) -> Result<Vec<ImageRef>, LoadError> {
    let images: Vec<ImageRef> = list_files(dir)?
        .into_iter()
        .filter_map(|path| stem(&path).map(|id| ImageRef::new(id, path)))
        .collect();
    tracing::info!(dir = %dir.display(), images = images.len(), "image corpus scanned");
    Ok(images)
}
