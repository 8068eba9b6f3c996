use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crewmatch_core::pipeline::DEFAULT_GENDER_CONFIDENCE;
use crewmatch_core::resolver::DEFAULT_JARO_WINKLER_THRESHOLD;
use crewmatch_core::vision::DEFAULT_SIMILARITY_THRESHOLD;
use crewmatch_core::{EmptyPoolPolicy, PipelineConfig, ResolveStrategy};
use crewmatch_vision::ClientConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyPool {
    /// Compare against the whole roster.
    Fallback,
    /// Issue no comparisons.
    Skip,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Resolver {
    /// First roster entry containing the recognized name.
    FirstSubstring,
    /// Best Jaro-Winkler match above the configured threshold.
    JaroWinkler,
}

/// Run configuration: defaults, then the TOML file, then `CREWMATCH_*`
/// environment variables, then command-line flags.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Roster CSV (name, gender, agency, ...).
    pub roster: PathBuf,
    /// Presence history CSV (name, in, out).
    pub history: PathBuf,
    /// Directory of reference images, one per identity.
    pub sources: PathBuf,
    /// Directory of photographs to resolve.
    pub images: PathBuf,
    /// Match records output.
    pub matches: PathBuf,
    /// Co-occurrence pairs output.
    pub pairs: PathBuf,
    /// Vision service base URL.
    pub endpoint: String,
    pub api_key: Option<String>,
    /// Timeout in seconds for each vision request.
    pub timeout_secs: u64,
    /// Minimum similarity (percent) for a comparison match.
    pub similarity_threshold: f32,
    /// Detector gender confidence (percent) required to narrow by gender.
    pub gender_confidence: f32,
    /// Images resolved concurrently.
    pub workers: usize,
    pub empty_pool: EmptyPool,
    pub resolver: Resolver,
    pub jaro_winkler_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            roster: PathBuf::from("data/roster.csv"),
            history: PathBuf::from("data/history.csv"),
            sources: PathBuf::from("images/source"),
            images: PathBuf::from("images/corpus"),
            matches: PathBuf::from("data/matches.txt"),
            pairs: PathBuf::from("data/pairs.txt"),
            endpoint: "http://127.0.0.1:8080".to_string(),
            api_key: None,
            timeout_secs: 30,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            gender_confidence: DEFAULT_GENDER_CONFIDENCE,
            workers: 1,
            empty_pool: EmptyPool::Fallback,
            resolver: Resolver::FirstSubstring,
            jaro_winkler_threshold: DEFAULT_JARO_WINKLER_THRESHOLD,
        }
    }
}

impl Config {
    /// Defaults, overlaid with `file` if given, then the environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Override from `CREWMATCH_*` variables. Unparseable values are ignored.
    pub fn apply_env(&mut self) {
        self.roster = env_path("CREWMATCH_ROSTER", &self.roster);
        self.history = env_path("CREWMATCH_HISTORY", &self.history);
        self.sources = env_path("CREWMATCH_SOURCES", &self.sources);
        self.images = env_path("CREWMATCH_IMAGES", &self.images);
        self.matches = env_path("CREWMATCH_MATCHES", &self.matches);
        self.pairs = env_path("CREWMATCH_PAIRS", &self.pairs);
        if let Ok(endpoint) = std::env::var("CREWMATCH_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Ok(key) = std::env::var("CREWMATCH_API_KEY") {
            self.api_key = Some(key).filter(|k| !k.is_empty());
        }
        self.timeout_secs = env_parse("CREWMATCH_TIMEOUT_SECS", self.timeout_secs);
        self.similarity_threshold =
            env_parse("CREWMATCH_SIMILARITY_THRESHOLD", self.similarity_threshold);
        self.gender_confidence = env_parse("CREWMATCH_GENDER_CONFIDENCE", self.gender_confidence);
        self.workers = env_parse("CREWMATCH_WORKERS", self.workers);
        self.jaro_winkler_threshold =
            env_parse("CREWMATCH_JARO_WINKLER_THRESHOLD", self.jaro_winkler_threshold);
        if let Some(policy) = env_enum::<EmptyPool>("CREWMATCH_EMPTY_POOL") {
            self.empty_pool = policy;
        }
        if let Some(resolver) = env_enum::<Resolver>("CREWMATCH_RESOLVER") {
            self.resolver = resolver;
        }
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            similarity_threshold: self.similarity_threshold,
            gender_confidence: self.gender_confidence,
            empty_pool_policy: match self.empty_pool {
                EmptyPool::Fallback => EmptyPoolPolicy::FallbackToRoster,
                EmptyPool::Skip => EmptyPoolPolicy::SkipComparison,
            },
            resolve_strategy: self.resolve_strategy(),
        }
    }

    pub fn resolve_strategy(&self) -> ResolveStrategy {
        match self.resolver {
            Resolver::FirstSubstring => ResolveStrategy::FirstSubstring,
            Resolver::JaroWinkler => ResolveStrategy::JaroWinkler {
                threshold: self.jaro_winkler_threshold,
            },
        }
    }

    pub fn client(&self) -> ClientConfig {
        ClientConfig {
            endpoint: self.endpoint.clone(),
            api_key: self.api_key.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

fn env_path(key: &str, default: &Path) -> PathBuf {
    std::env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| default.to_path_buf())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_enum<T: ValueEnum>(key: &str) -> Option<T> {
    std::env::var(key)
        .ok()
        .and_then(|v| T::from_str(&v, true).ok())
}
