//! Maps raw names returned by celebrity-style recognition onto roster
//! identities. The service spells names inconsistently, so the match is
//! against a fixed vocabulary rather than an exact key lookup.

use crate::roster::Roster;
use crate::types::Identity;

/// Default Jaro-Winkler acceptance threshold for [`ResolveStrategy::JaroWinkler`].
pub const DEFAULT_JARO_WINKLER_THRESHOLD: f64 = 0.90;

/// How a raw name is turned into a single roster identity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ResolveStrategy {
    /// First roster entry (in roster order) whose joined fields contain the
    /// raw name. Ambiguous fragments silently resolve to the earliest entry.
    #[default]
    FirstSubstring,
    /// Highest-scoring entry at or above `threshold`. Substring hits score 1.0;
    /// ties keep roster order.
    JaroWinkler { threshold: f64 },
}

/// A scored resolution candidate.
#[derive(Debug, Clone, Copy)]
pub struct NameCandidate<'r> {
    pub identity: &'r Identity,
    /// Similarity in [0, 1].
    pub score: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NameResolver {
    strategy: ResolveStrategy,
}

impl NameResolver {
    pub fn new(strategy: ResolveStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> ResolveStrategy {
        self.strategy
    }

    /// Resolve one raw name. Blank input never matches.
    pub fn resolve<'r>(&self, roster: &'r Roster, raw: &str) -> Option<&'r Identity> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        match self.strategy {
            ResolveStrategy::FirstSubstring => {
                roster.iter().find(|id| id.search_text().contains(raw))
            }
            ResolveStrategy::JaroWinkler { threshold } => self
                .rank(roster, raw)
                .into_iter()
                .next()
                .filter(|c| c.score >= threshold)
                .map(|c| c.identity),
        }
    }

    /// Resolve a batch of raw names, dropping misses and repeats. Output
    /// follows input order.
    pub fn resolve_all<'r>(&self, roster: &'r Roster, raw_names: &[String]) -> Vec<&'r Identity> {
        let mut out: Vec<&'r Identity> = Vec::with_capacity(raw_names.len());
        for raw in raw_names {
            match self.resolve(roster, raw) {
                Some(id) if out.iter().any(|o| o.name == id.name) => {
                    tracing::debug!(raw = %raw, name = %id.name, "duplicate recognition ignored");
                }
                Some(id) => {
                    tracing::debug!(raw = %raw, name = %id.name, "recognized name resolved");
                    out.push(id);
                }
                None => {
                    tracing::debug!(raw = %raw, "recognized name not on roster");
                }
            }
        }
        out
    }

    /// Score every roster entry against `raw`, best first. Entries scoring
    /// zero are omitted.
    pub fn rank<'r>(&self, roster: &'r Roster, raw: &str) -> Vec<NameCandidate<'r>> {
        let needle = raw.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut ranked: Vec<NameCandidate<'r>> = roster
            .iter()
            .map(|identity| NameCandidate {
                identity,
                score: score(identity, &needle),
            })
            .filter(|c| c.score > 0.0)
            .collect();

        // Stable: equal scores keep roster order.
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked
    }
}

fn score(identity: &Identity, needle: &str) -> f64 {
    if identity.search_text().to_lowercase().contains(needle) {
        return 1.0;
    }
    std::iter::once(identity.name.as_str())
        .chain(identity.extra.iter().map(String::as_str))
        .map(|field| strsim::jaro_winkler(needle, &field.to_lowercase()))
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Gender;

    fn roster() -> Roster {
        Roster::new(vec![
            Identity::new("John Smithers", Gender::Male, "NASA"),
            Identity::new("J. Smith", Gender::Male, "ESA"),
            Identity::new("Svetlana Savitskaya", Gender::Female, "Roscosmos")
                .with_extra(vec!["Svetlana Savitskaja".into()]),
        ])
        .unwrap()
    }

    #[test]
    fn test_first_substring_exact() {
        let roster = roster();
        let resolver = NameResolver::default();
        let id = resolver.resolve(&roster, "J. Smith").unwrap();
        assert_eq!(id.name, "J. Smith");
    }

    #[test]
    fn test_first_substring_takes_earliest_on_ambiguity() {
        let roster = roster();
        let resolver = NameResolver::default();
        // "Smith" occurs in both entries; roster order wins.
        let id = resolver.resolve(&roster, "Smith").unwrap();
        assert_eq!(id.name, "John Smithers");
    }

    #[test]
    fn test_first_substring_matches_extra_field() {
        let roster = roster();
        let id = NameResolver::default()
            .resolve(&roster, "Savitskaja")
            .unwrap();
        assert_eq!(id.name, "Svetlana Savitskaya");
    }

    #[test]
    fn test_blank_and_unknown_names_do_not_resolve() {
        let roster = roster();
        let resolver = NameResolver::default();
        assert!(resolver.resolve(&roster, "").is_none());
        assert!(resolver.resolve(&roster, "   ").is_none());
        assert!(resolver.resolve(&roster, "Neil Armstrong").is_none());
    }

    #[test]
    fn test_jaro_winkler_tolerates_misspelling() {
        let roster = roster();
        let resolver = NameResolver::new(ResolveStrategy::JaroWinkler {
            threshold: DEFAULT_JARO_WINKLER_THRESHOLD,
        });
        let id = resolver.resolve(&roster, "Svetlana Savitskya").unwrap();
        assert_eq!(id.name, "Svetlana Savitskaya");
        assert!(resolver.resolve(&roster, "Neil Armstrong").is_none());
    }

    #[test]
    fn test_rank_orders_best_first() {
        let roster = roster();
        let ranked = NameResolver::default().rank(&roster, "J. Smith");
        assert_eq!(ranked[0].identity.name, "J. Smith");
        assert_eq!(ranked[0].score, 1.0);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_resolve_all_drops_misses_and_repeats() {
        let roster = roster();
        let raw = vec![
            "J. Smith".to_string(),
            "Nobody".to_string(),
            "J. Smith".to_string(),
            "Savitskaya".to_string(),
        ];
        let names: Vec<_> = NameResolver::default()
            .resolve_all(&roster, &raw)
            .into_iter()
            .map(|id| id.name.as_str())
            .collect();
        assert_eq!(names, vec!["J. Smith", "Svetlana Savitskaya"]);
    }
}
