//! Per-image candidate pool and the filters that narrow it.
//!
//! A pool starts as the whole roster and only ever shrinks. The empty-pool
//! fallback is applied when candidates are taken for comparison, never by
//! refilling the pool itself.

use crate::roster::Roster;
use crate::timeline::PresenceTimeline;
use crate::types::{DetectedFace, Gender, Identity};

/// What to do when narrowing leaves no candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmptyPoolPolicy {
    /// Treat an empty pool as "no constraint" and compare against the full roster.
    #[default]
    FallbackToRoster,
    /// Treat an empty pool as "no possible match" and issue no comparisons.
    SkipComparison,
}

/// Filter chosen for an image, by number of detected faces.
#[derive(Debug, Clone, PartialEq)]
pub enum Narrowing {
    /// Single face: its gender constrains the whole pool.
    Gender(Gender),
    /// Several faces: keep identities co-present with any recognized name.
    Presence(Vec<String>),
}

impl Narrowing {
    /// `None` when no faces were detected.
    pub fn for_faces(faces: &[DetectedFace], recognized: &[String]) -> Option<Self> {
        match faces {
            [] => None,
            [face] => Some(Narrowing::Gender(face.gender)),
            _ => Some(Narrowing::Presence(recognized.to_vec())),
        }
    }
}

/// Working subset of the roster for one image. Members stay in roster order.
#[derive(Debug, Clone)]
pub struct CandidatePool<'r> {
    roster: &'r Roster,
    members: Vec<usize>,
}

impl<'r> CandidatePool<'r> {
    pub fn full(roster: &'r Roster) -> Self {
        Self {
            roster,
            members: (0..roster.len()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.roster
            .position(name)
            .is_some_and(|p| self.members.binary_search(&p).is_ok())
    }

    pub fn iter(&self) -> impl Iterator<Item = &'r Identity> + '_ {
        let roster = self.roster;
        self.members.iter().filter_map(move |&p| roster.get(p))
    }

    /// Keep only identities of `gender`. `Unknown` carries no information and
    /// leaves the pool unchanged.
    pub fn narrow_by_gender(&mut self, gender: Gender) {
        if gender == Gender::Unknown {
            return;
        }
        let roster = self.roster;
        self.members
            .retain(|&p| roster.get(p).is_some_and(|id| id.gender == gender));
    }

    /// Keep identities with a presence window overlapping any window of at
    /// least one of `recognized`. With nothing recognized there is no overlap
    /// evidence and the pool is left unchanged.
    pub fn narrow_by_presence(&mut self, timeline: &PresenceTimeline, recognized: &[String]) {
        if recognized.is_empty() {
            return;
        }
        let roster = self.roster;
        self.members.retain(|&p| {
            roster.get(p).is_some_and(|candidate| {
                recognized
                    .iter()
                    .any(|known| timeline.co_present(known, &candidate.name))
            })
        });
    }

    pub fn apply(&mut self, narrowing: &Narrowing, timeline: &PresenceTimeline) {
        let before = self.len();
        match narrowing {
            Narrowing::Gender(gender) => self.narrow_by_gender(*gender),
            Narrowing::Presence(recognized) => self.narrow_by_presence(timeline, recognized),
        }
        tracing::debug!(
            filter = ?narrowing,
            before,
            after = self.len(),
            "candidate pool narrowed"
        );
    }

    /// Identities to compare against, in roster order, after applying
    /// `policy` to an empty pool.
    pub fn candidates(&self, policy: EmptyPoolPolicy) -> Vec<&'r Identity> {
        if !self.is_empty() {
            return self.iter().collect();
        }
        match policy {
            EmptyPoolPolicy::FallbackToRoster => {
                tracing::debug!("candidate pool empty; falling back to full roster");
                self.roster.iter().collect()
            }
            EmptyPoolPolicy::SkipComparison => {
                tracing::debug!("candidate pool empty; skipping comparison");
                Vec::new()
            }
        }
    }
}
