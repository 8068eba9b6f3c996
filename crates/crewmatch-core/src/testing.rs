//! In-memory vision service for unit tests.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::types::Gender;
use crate::vision::{FaceDetail, VisionError, VisionService};

pub fn day(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Scripted responses keyed by image path. Unknown images detect no faces.
#[derive(Default)]
pub struct FakeVision {
    faces: HashMap<PathBuf, Vec<FaceDetail>>,
    failing_detection: HashSet<PathBuf>,
    celebrities: HashMap<PathBuf, Vec<String>>,
    failing_recognition: HashSet<PathBuf>,
    matches: HashSet<(PathBuf, PathBuf)>,
    compare_calls: Mutex<Vec<(String, String)>>,
    recognize_calls: AtomicUsize,
}

impl FakeVision {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn faces(mut self, image: &str, faces: &[(Gender, f32)]) -> Self {
        let details = faces
            .iter()
            .map(|&(gender, gender_confidence)| FaceDetail {
                gender,
                gender_confidence,
                roll: 0.0,
                yaw: 0.0,
                pitch: 0.0,
            })
            .collect();
        self.faces.insert(PathBuf::from(image), details);
        self
    }

    pub fn failing_detection(mut self, image: &str) -> Self {
        self.failing_detection.insert(PathBuf::from(image));
        self
    }

    pub fn celebrities(mut self, image: &str, names: &[&str]) -> Self {
        self.celebrities.insert(
            PathBuf::from(image),
            names.iter().map(|n| n.to_string()).collect(),
        );
        self
    }

    pub fn failing_recognition(mut self, image: &str) -> Self {
        self.failing_recognition.insert(PathBuf::from(image));
        self
    }

    pub fn matching(mut self, source: &str, target: &str) -> Self {
        self.matches
            .insert((PathBuf::from(source), PathBuf::from(target)));
        self
    }

    /// `(source, target)` of every comparison issued, in call order.
    pub fn compare_calls(&self) -> Vec<(String, String)> {
        self.compare_calls.lock().unwrap().clone()
    }

    pub fn recognize_calls(&self) -> usize {
        self.recognize_calls.load(Ordering::SeqCst)
    }
}

impl VisionService for FakeVision {
    fn detect_faces(&self, image: &Path) -> Result<Vec<FaceDetail>, VisionError> {
        if self.failing_detection.contains(image) {
            return Err(VisionError::Transport("scripted detection failure".into()));
        }
        Ok(self.faces.get(image).cloned().unwrap_or_default())
    }

    fn recognize_names(&self, image: &Path) -> Result<Vec<String>, VisionError> {
        self.recognize_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_recognition.contains(image) {
            return Err(VisionError::Response("scripted recognition failure".into()));
        }
        Ok(self.celebrities.get(image).cloned().unwrap_or_default())
    }

    fn compare_faces(
        &self,
        source: &Path,
        target: &Path,
        _similarity_threshold: f32,
    ) -> Result<usize, VisionError> {
        self.compare_calls.lock().unwrap().push((
            source.to_string_lossy().into_owned(),
            target.to_string_lossy().into_owned(),
        ));
        let hit = self
            .matches
            .contains(&(source.to_path_buf(), target.to_path_buf()));
        Ok(usize::from(hit))
    }
}

/// Run `f` under a plain-text subscriber capped at `level` and return
/// everything it logged.
pub fn capture_logs<T>(level: tracing::Level, f: impl FnOnce() -> T) -> (T, String) {
    let buffer = Arc::new(Mutex::new(Vec::<u8>::new()));
    let sink = Arc::clone(&buffer);
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(move || LogWriter(Arc::clone(&sink)))
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    let text = String::from_utf8_lossy(&buffer.lock().unwrap()).into_owned();
    (out, text)
}

struct LogWriter(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
