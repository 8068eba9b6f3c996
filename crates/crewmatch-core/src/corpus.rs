//! Corpus driver: runs the pipeline over every image with bounded
//! concurrency against the vision service.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::pipeline::{ImageOutcome, ResolutionPipeline};
use crate::sink::{MatchSink, SinkError};
use crate::types::ImageRef;

/// Totals for a corpus run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorpusSummary {
    pub images: usize,
    /// Images that produced a record.
    pub processed: usize,
    /// Images dropped on detection failure.
    pub skipped: usize,
    /// Processed images with every detected face matched.
    pub complete: usize,
    pub faces: usize,
    pub unresolved_faces: usize,
    pub comparisons: usize,
}

impl CorpusSummary {
    fn record(&mut self, outcome: &ImageOutcome) {
        match outcome {
            ImageOutcome::Skipped { .. } => self.skipped += 1,
            ImageOutcome::Done(r) => {
                self.processed += 1;
                self.faces += r.faces;
                self.unresolved_faces += r.unresolved();
                self.comparisons += r.comparisons;
                if r.is_complete() {
                    self.complete += 1;
                }
            }
        }
    }

    fn merge(&mut self, other: &CorpusSummary) {
        self.processed += other.processed;
        self.skipped += other.skipped;
        self.complete += other.complete;
        self.faces += other.faces;
        self.unresolved_faces += other.unresolved_faces;
        self.comparisons += other.comparisons;
    }
}

/// Resolve every image in `images`, appending each record to `sink`.
///
/// At most `workers` images are in flight at once, which bounds concurrent
/// requests to the vision service. Each image is handled start to finish
/// by one worker. A failing image never stops the run; a failing sink does.
pub fn run_corpus(
    pipeline: &ResolutionPipeline<'_>,
    images: &[ImageRef],
    sink: &dyn MatchSink,
    workers: usize,
) -> Result<CorpusSummary, SinkError> {
    let workers = workers.clamp(1, images.len().max(1));
    tracing::info!(images = images.len(), workers, "resolving corpus");

    let next = AtomicUsize::new(0);
    let abort = AtomicBool::new(false);

    let work = || -> Result<CorpusSummary, SinkError> {
        let mut summary = CorpusSummary::default();
        while !abort.load(Ordering::Relaxed) {
            let Some(image) = images.get(next.fetch_add(1, Ordering::Relaxed)) else {
                break;
            };
            match pipeline.process(image, sink) {
                Ok(outcome) => summary.record(&outcome),
                Err(e) => {
                    abort.store(true, Ordering::Relaxed);
                    tracing::error!(image = %image.id, error = %e, "cannot persist match record");
                    return Err(e);
                }
            }
        }
        Ok(summary)
    };

    let results: Vec<Result<CorpusSummary, SinkError>> = if workers == 1 {
        vec![work()]
    } else {
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers).map(|_| scope.spawn(&work)).collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        })
    };

    let mut total = CorpusSummary {
        images: images.len(),
        ..CorpusSummary::default()
    };
    for result in results {
        total.merge(&result?);
    }

    tracing::info!(
        processed = total.processed,
        skipped = total.skipped,
        complete = total.complete,
        unresolved_faces = total.unresolved_faces,
        comparisons = total.comparisons,
        "corpus resolved"
    );
    Ok(total)
}
