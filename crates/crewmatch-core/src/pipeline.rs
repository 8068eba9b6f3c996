//! Per-image resolution: detect, recognize, narrow, compare, finalize.
//!
//! Every image gets a fresh [`CandidatePool`] and [`MatchRecord`]; nothing
//! is shared between images except the immutable roster, timeline and
//! gallery. Comparison stops the moment every detected face is accounted for.

use crate::gallery::SourceGallery;
use crate::pool::{CandidatePool, EmptyPoolPolicy, Narrowing};
use crate::resolver::{NameResolver, ResolveStrategy};
use crate::roster::Roster;
use crate::sink::{MatchSink, SinkError};
use crate::timeline::PresenceTimeline;
use crate::types::{DetectedFace, ImageRef, MatchRecord};
use crate::vision::{VisionError, VisionService, DEFAULT_SIMILARITY_THRESHOLD};

/// Detector gender confidence (percent) a label must exceed to be used.
pub const DEFAULT_GENDER_CONFIDENCE: f32 = 85.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Similarity (percent) passed to every pairwise comparison.
    pub similarity_threshold: f32,
    /// Gender labels at or below this confidence become `Unknown`.
    pub gender_confidence: f32,
    pub empty_pool_policy: EmptyPoolPolicy,
    pub resolve_strategy: ResolveStrategy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            gender_confidence: DEFAULT_GENDER_CONFIDENCE,
            empty_pool_policy: EmptyPoolPolicy::default(),
            resolve_strategy: ResolveStrategy::default(),
        }
    }
}

/// Resolution states. `Skipped` is only reachable from `Detecting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Detecting,
    Recognizing,
    Narrowing,
    Comparing,
    Finalizing,
    Done,
    Skipped,
}

/// A completed (possibly partial) resolution of one image.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub record: MatchRecord,
    /// Faces reported by the detector.
    pub faces: usize,
    /// Names contributed by bulk recognition.
    pub recognized: usize,
    /// Candidates left after narrowing; the roster size if narrowing never ran.
    pub pool_size: usize,
    /// Pairwise comparison calls issued.
    pub comparisons: usize,
}

impl Resolution {
    /// Faces still unaccounted for.
    pub fn unresolved(&self) -> usize {
        self.faces.saturating_sub(self.record.len())
    }

    pub fn is_complete(&self) -> bool {
        self.unresolved() == 0
    }
}

#[derive(Debug)]
pub enum ImageOutcome {
    /// Detection failed; the image produces no record.
    Skipped { image_id: String, error: VisionError },
    Done(Resolution),
}

impl ImageOutcome {
    pub fn stage(&self) -> Stage {
        match self {
            ImageOutcome::Skipped { .. } => Stage::Skipped,
            ImageOutcome::Done(_) => Stage::Done,
        }
    }

    pub fn record(&self) -> Option<&MatchRecord> {
        match self {
            ImageOutcome::Skipped { .. } => None,
            ImageOutcome::Done(resolution) => Some(&resolution.record),
        }
    }
}

/// Resolves images against the roster using an external vision service.
///
/// Holds only shared, read-only state, so a single pipeline can serve
/// several worker threads at once.
pub struct ResolutionPipeline<'a> {
    roster: &'a Roster,
    timeline: &'a PresenceTimeline,
    gallery: &'a SourceGallery,
    vision: &'a dyn VisionService,
    resolver: NameResolver,
    config: PipelineConfig,
}

impl<'a> ResolutionPipeline<'a> {
    pub fn new(
        roster: &'a Roster,
        timeline: &'a PresenceTimeline,
        gallery: &'a SourceGallery,
        vision: &'a dyn VisionService,
        config: PipelineConfig,
    ) -> Self {
        Self {
            roster,
            timeline,
            gallery,
            vision,
            resolver: NameResolver::new(config.resolve_strategy),
            config,
        }
    }

    /// Resolve one image and persist its record to `sink`.
    ///
    /// Skipped images are not persisted. Only a sink failure is an error;
    /// vision failures are absorbed per image.
    pub fn process(
        &self,
        image: &ImageRef,
        sink: &dyn MatchSink,
    ) -> Result<ImageOutcome, SinkError> {
        let outcome = self.resolve(image);
        if let ImageOutcome::Done(resolution) = &outcome {
            enter(&image.id, Stage::Finalizing);
            sink.append(&resolution.record)?;
            enter(&image.id, Stage::Done);
        }
        Ok(outcome)
    }

    /// Run every stage up to (not including) persistence.
    pub fn resolve(&self, image: &ImageRef) -> ImageOutcome {
        enter(&image.id, Stage::Detecting);
        let faces: Vec<DetectedFace> = match self.vision.detect_faces(&image.path) {
            Ok(details) => details
                .iter()
                .map(|d| DetectedFace::from_detail(d, self.config.gender_confidence))
                .collect(),
            Err(error) => {
                tracing::warn!(image = %image.id, error = %error, "face detection failed; skipping image");
                enter(&image.id, Stage::Skipped);
                return ImageOutcome::Skipped {
                    image_id: image.id.clone(),
                    error,
                };
            }
        };

        let mut record = MatchRecord::new(image.id.clone());
        if faces.is_empty() {
            tracing::debug!(image = %image.id, "no faces detected");
            return ImageOutcome::Done(Resolution {
                record,
                faces: 0,
                recognized: 0,
                pool_size: self.roster.len(),
                comparisons: 0,
            });
        }

        enter(&image.id, Stage::Recognizing);
        self.recognize(image, faces.len(), &mut record);
        let recognized = record.len();

        let mut remaining = faces.len() - recognized;
        let mut pool_size = self.roster.len();
        let mut comparisons = 0;
        if remaining > 0 {
            enter(&image.id, Stage::Narrowing);
            let mut pool = CandidatePool::full(self.roster);
            if let Some(narrowing) = Narrowing::for_faces(&faces, &record.names) {
                pool.apply(&narrowing, self.timeline);
            }
            pool_size = pool.len();

            enter(&image.id, Stage::Comparing);
            comparisons = self.compare(image, &pool, &mut record, &mut remaining);
        }

        if remaining > 0 {
            tracing::warn!(
                image = %image.id,
                faces = faces.len(),
                matched = record.len(),
                unresolved = remaining,
                "faces left unresolved"
            );
        } else {
            tracing::debug!(image = %image.id, matched = ?record.names, "all faces resolved");
        }

        ImageOutcome::Done(Resolution {
            record,
            faces: faces.len(),
            recognized,
            pool_size,
            comparisons,
        })
    }

    /// Bulk recognition: one call per image regardless of face count.
    /// Never records more names than there are faces.
    fn recognize(&self, image: &ImageRef, face_count: usize, record: &mut MatchRecord) {
        let raw = match self.vision.recognize_names(&image.path) {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(image = %image.id, error = %error, "recognition failed; treating as no matches");
                Vec::new()
            }
        };

        for identity in self.resolver.resolve_all(self.roster, &raw) {
            if record.len() == face_count {
                tracing::warn!(
                    image = %image.id,
                    name = %identity.name,
                    faces = face_count,
                    "more recognized names than faces; ignoring extra"
                );
                break;
            }
            record.push(identity.name.clone());
        }
    }

    /// Compare the image against each candidate's reference image in roster
    /// order until every face is accounted for. Returns the number of
    /// comparison calls issued.
    fn compare(
        &self,
        image: &ImageRef,
        pool: &CandidatePool<'_>,
        record: &mut MatchRecord,
        remaining: &mut usize,
    ) -> usize {
        let mut calls = 0;
        for candidate in pool.candidates(self.config.empty_pool_policy) {
            if *remaining == 0 {
                break;
            }
            if record.contains(&candidate.name) {
                continue;
            }
            let Some(source) = self.gallery.get(&candidate.name) else {
                tracing::debug!(name = %candidate.name, "no reference image; cannot compare");
                continue;
            };

            calls += 1;
            match self
                .vision
                .compare_faces(source, &image.path, self.config.similarity_threshold)
            {
                Ok(0) => {}
                Ok(matches) => {
                    tracing::debug!(image = %image.id, name = %candidate.name, matches, "face matched by comparison");
                    record.push(candidate.name.clone());
                    *remaining -= 1;
                }
                Err(error) => {
                    tracing::warn!(
                        image = %image.id,
                        name = %candidate.name,
                        error = %error,
                        "comparison failed; treating as no match"
                    );
                }
            }
        }
        calls
    }
}

fn enter(image_id: &str, stage: Stage) {
    tracing::debug!(image = image_id, ?stage, "stage");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use crate::testing::{capture_logs, day, FakeVision};
    use crate::types::{Gender, Identity};

    struct Fixture {
        roster: Roster,
        timeline: PresenceTimeline,
        gallery: SourceGallery,
    }

    /// Six identities; "J. Smith" shares a window with "Ann Lee" and
    /// "Cal Ruiz" only.
    fn fixture() -> Fixture {
        let roster = Roster::new(vec![
            Identity::new("Ann Lee", Gender::Female, "NASA"),
            Identity::new("Bob Stone", Gender::Male, "ESA"),
            Identity::new("Cal Ruiz", Gender::Male, "NASA"),
            Identity::new("Dee Park", Gender::Female, "KARI"),
            Identity::new("J. Smith", Gender::Male, "NASA"),
            Identity::new("Eli Moss", Gender::Male, "CSA"),
        ])
        .unwrap();

        let mut timeline = PresenceTimeline::new();
        timeline.insert_range("J. Smith", day(2011, 3, 1), day(2011, 9, 1)).unwrap();
        timeline.insert_range("Ann Lee", day(2011, 1, 1), day(2011, 4, 1)).unwrap();
        timeline.insert_range("Cal Ruiz", day(2011, 8, 1), day(2012, 1, 1)).unwrap();
        timeline.insert_range("Bob Stone", day(2013, 1, 1), day(2013, 6, 1)).unwrap();
        timeline.insert_range("Dee Park", day(2009, 1, 1), day(2009, 6, 1)).unwrap();
        timeline.insert_range("Eli Moss", day(2014, 1, 1), day(2014, 6, 1)).unwrap();

        let mut gallery = SourceGallery::new();
        for id in roster.iter() {
            gallery.insert(id.name.clone(), format!("src/{}.jpg", id.name.replace(' ', "_")));
        }

        Fixture {
            roster,
            timeline,
            gallery,
        }
    }

    fn src(name: &str) -> String {
        format!("src/{}.jpg", name.replace(' ', "_"))
    }

    fn pipeline<'a>(fx: &'a Fixture, vision: &'a FakeVision) -> ResolutionPipeline<'a> {
        ResolutionPipeline::new(
            &fx.roster,
            &fx.timeline,
            &fx.gallery,
            vision,
            PipelineConfig::default(),
        )
    }

    fn done(outcome: ImageOutcome) -> Resolution {
        match outcome {
            ImageOutcome::Done(r) => r,
            other => panic!("expected Done, got {other:?}"),
        }
    }

    #[test]
    fn test_single_face_recognized_needs_no_comparison() {
        let fx = fixture();
        let vision = FakeVision::new()
            .faces("img/1.jpg", &[(Gender::Male, 99.0)])
            .celebrities("img/1.jpg", &["Bob Stone"]);
        let r = done(pipeline(&fx, &vision).resolve(&ImageRef::new("1", "img/1.jpg")));

        assert_eq!(r.record.names, vec!["Bob Stone"]);
        assert_eq!(r.comparisons, 0);
        assert_eq!(vision.compare_calls().len(), 0);
        assert!(r.is_complete());
    }

    #[test]
    fn test_stage_transitions_logged_at_debug() {
        let fx = fixture();
        let vision = FakeVision::new()
            .faces("img/1.jpg", &[(Gender::Male, 99.0)])
            .celebrities("img/1.jpg", &["Bob Stone"]);
        let sink = MemorySink::new();
        let (outcome, logs) = capture_logs(tracing::Level::DEBUG, || {
            pipeline(&fx, &vision).process(&ImageRef::new("1", "img/1.jpg"), &sink)
        });

        assert_eq!(outcome.unwrap().stage(), Stage::Done);
        for stage in ["Detecting", "Recognizing", "Finalizing", "Done"] {
            assert!(logs.contains(&format!("stage={stage}")), "missing {stage} in:\n{logs}");
        }
        assert!(logs.lines().filter(|l| l.contains("stage=")).all(|l| l.contains("DEBUG")));
    }

    #[test]
    fn test_single_male_face_compares_male_pool_only() {
        let fx = fixture();
        let vision = FakeVision::new()
            .faces("img/1.jpg", &[(Gender::Male, 90.0)])
            .matching(&src("Eli Moss"), "img/1.jpg");
        let r = done(pipeline(&fx, &vision).resolve(&ImageRef::new("1", "img/1.jpg")));

        assert_eq!(r.pool_size, 4);
        assert_eq!(r.record.names, vec!["Eli Moss"]);
        let compared: Vec<_> = vision.compare_calls().into_iter().map(|(s, _)| s).collect();
        assert_eq!(
            compared,
            vec![src("Bob Stone"), src("Cal Ruiz"), src("J. Smith"), src("Eli Moss")]
        );
    }

    #[test]
    fn test_low_confidence_gender_does_not_narrow() {
        let fx = fixture();
        let vision = FakeVision::new().faces("img/1.jpg", &[(Gender::Male, 60.0)]);
        let r = done(pipeline(&fx, &vision).resolve(&ImageRef::new("1", "img/1.jpg")));

        assert_eq!(r.pool_size, fx.roster.len());
        assert_eq!(r.comparisons, fx.roster.len());
        assert!(r.record.is_empty());
        assert_eq!(r.unresolved(), 1);
    }

    #[test]
    fn test_two_faces_presence_narrowing_restricts_comparisons() {
        let fx = fixture();
        let vision = FakeVision::new()
            .faces("img/2.jpg", &[(Gender::Male, 99.0), (Gender::Female, 99.0)])
            .celebrities("img/2.jpg", &["J. Smith"])
            .matching(&src("Cal Ruiz"), "img/2.jpg");
        let r = done(pipeline(&fx, &vision).resolve(&ImageRef::new("2", "img/2.jpg")));

        assert_eq!(r.record.names, vec!["J. Smith", "Cal Ruiz"]);
        assert_eq!(r.recognized, 1);
        // Pool holds J. Smith himself plus the two co-present identities.
        assert_eq!(r.pool_size, 3);
        let compared: Vec<_> = vision.compare_calls().into_iter().map(|(s, _)| s).collect();
        assert_eq!(compared, vec![src("Ann Lee"), src("Cal Ruiz")]);
    }

    #[test]
    fn test_early_exit_once_all_faces_resolved() {
        let fx = fixture();
        let vision = FakeVision::new()
            .faces("img/3.jpg", &[(Gender::Unknown, 0.0), (Gender::Unknown, 0.0)])
            .matching(&src("Ann Lee"), "img/3.jpg")
            .matching(&src("Bob Stone"), "img/3.jpg")
            .matching(&src("Cal Ruiz"), "img/3.jpg");
        let r = done(pipeline(&fx, &vision).resolve(&ImageRef::new("3", "img/3.jpg")));

        assert_eq!(r.record.names, vec!["Ann Lee", "Bob Stone"]);
        assert_eq!(r.comparisons, 2);
        assert_eq!(vision.compare_calls().len(), 2);
    }

    #[test]
    fn test_names_never_exceed_face_count() {
        let fx = fixture();
        let vision = FakeVision::new()
            .faces("img/4.jpg", &[(Gender::Male, 99.0)])
            .celebrities("img/4.jpg", &["Bob Stone", "Cal Ruiz", "Ann Lee"]);
        let r = done(pipeline(&fx, &vision).resolve(&ImageRef::new("4", "img/4.jpg")));

        assert_eq!(r.record.names, vec!["Bob Stone"]);
        assert!(r.record.len() <= r.faces);
    }

    #[test]
    fn test_detection_failure_skips_image() {
        let fx = fixture();
        let vision = FakeVision::new().failing_detection("img/5.jpg");
        let sink = MemorySink::new();
        let outcome = pipeline(&fx, &vision)
            .process(&ImageRef::new("5", "img/5.jpg"), &sink)
            .unwrap();

        assert_eq!(outcome.stage(), Stage::Skipped);
        assert!(outcome.record().is_none());
        assert!(sink.records().is_empty());
        assert_eq!(vision.compare_calls().len(), 0);
    }

    #[test]
    fn test_no_faces_yields_empty_record() {
        let fx = fixture();
        let vision = FakeVision::new().faces("img/6.jpg", &[]);
        let sink = MemorySink::new();
        let outcome = pipeline(&fx, &vision)
            .process(&ImageRef::new("6", "img/6.jpg"), &sink)
            .unwrap();

        assert_eq!(outcome.stage(), Stage::Done);
        assert_eq!(sink.records(), vec![MatchRecord::new("6")]);
        assert_eq!(vision.recognize_calls(), 0);
    }

    #[test]
    fn test_recognition_failure_falls_through_to_comparison() {
        let fx = fixture();
        let vision = FakeVision::new()
            .faces("img/7.jpg", &[(Gender::Female, 95.0)])
            .failing_recognition("img/7.jpg")
            .matching(&src("Dee Park"), "img/7.jpg");
        let r = done(pipeline(&fx, &vision).resolve(&ImageRef::new("7", "img/7.jpg")));

        assert_eq!(r.record.names, vec!["Dee Park"]);
        assert_eq!(r.comparisons, 2);
    }

    #[test]
    fn test_candidates_without_reference_image_are_skipped() {
        let mut fx = fixture();
        fx.gallery = SourceGallery::new();
        fx.gallery.insert("Dee Park", src("Dee Park"));
        let vision = FakeVision::new()
            .faces("img/8.jpg", &[(Gender::Female, 95.0)])
            .matching(&src("Dee Park"), "img/8.jpg");
        let r = done(pipeline(&fx, &vision).resolve(&ImageRef::new("8", "img/8.jpg")));

        assert_eq!(r.record.names, vec!["Dee Park"]);
        assert_eq!(r.comparisons, 1);
    }

    #[test]
    fn test_skip_comparison_policy_on_empty_pool() {
        let fx = fixture();
        // "Bob Stone" is recognized but nobody in this timeline overlaps him.
        let mut unrelated = PresenceTimeline::new();
        unrelated.insert_range("Ghost", day(2000, 1, 1), day(2000, 2, 1)).unwrap();
        let vision = FakeVision::new()
            .faces("img/9.jpg", &[(Gender::Male, 99.0), (Gender::Male, 99.0)])
            .celebrities("img/9.jpg", &["Bob Stone"]);
        let config = PipelineConfig {
            empty_pool_policy: EmptyPoolPolicy::SkipComparison,
            ..PipelineConfig::default()
        };
        let p = ResolutionPipeline::new(&fx.roster, &unrelated, &fx.gallery, &vision, config);
        let r = done(p.resolve(&ImageRef::new("9", "img/9.jpg")));

        assert_eq!(r.record.names, vec!["Bob Stone"]);
        assert_eq!(r.pool_size, 0);
        assert_eq!(r.comparisons, 0);
        assert_eq!(r.unresolved(), 1);
    }

    #[test]
    fn test_fallback_policy_on_empty_pool_compares_full_roster() {
        let fx = fixture();
        let empty = PresenceTimeline::new();
        let vision = FakeVision::new()
            .faces("img/9.jpg", &[(Gender::Male, 99.0), (Gender::Male, 99.0)])
            .celebrities("img/9.jpg", &["Bob Stone"]);
        let p = ResolutionPipeline::new(
            &fx.roster,
            &empty,
            &fx.gallery,
            &vision,
            PipelineConfig::default(),
        );
        let r = done(p.resolve(&ImageRef::new("9", "img/9.jpg")));

        assert_eq!(r.pool_size, 0);
        // Everyone except the recognized identity.
        assert_eq!(r.comparisons, fx.roster.len() - 1);
    }
}
