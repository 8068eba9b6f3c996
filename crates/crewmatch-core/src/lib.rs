//! crewmatch-core — Identity resolution for crew photographs.
//!
//! Turns noisy detection, recognition and comparison signals from an
//! external vision service into a per-image list of roster identities.
//! Roster attributes and presence history shrink the candidate pool
//! before any pairwise comparison is issued.

pub mod corpus;
pub mod gallery;
pub mod pairs;
pub mod pipeline;
pub mod pool;
pub mod resolver;
pub mod roster;
pub mod sink;
pub mod timeline;
pub mod types;
pub mod vision;

#[cfg(test)]
mod testing;

pub use corpus::{run_corpus, CorpusSummary};
pub use gallery::SourceGallery;
pub use pairs::{PairEmitter, Pairs};
pub use pipeline::{ImageOutcome, PipelineConfig, Resolution, ResolutionPipeline, Stage};
pub use pool::{CandidatePool, EmptyPoolPolicy, Narrowing};
pub use resolver::{NameCandidate, NameResolver, ResolveStrategy};
pub use roster::{Roster, RosterError};
pub use sink::{MatchSink, MemorySink, SinkError};
pub use timeline::{PresenceInterval, PresenceTimeline, TimelineError};
pub use types::{DetectedFace, Gender, Identity, ImageRef, MatchRecord, PairRecord};
pub use vision::{FaceDetail, VisionError, VisionService};
