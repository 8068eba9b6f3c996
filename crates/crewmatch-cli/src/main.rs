use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crewmatch_core::{run_corpus, NameResolver, PairEmitter, ResolutionPipeline};
use crewmatch_io::{
    load_roster, load_timeline, read_matches, save_pairs, scan_corpus, scan_gallery, MatchFileSink,
};
use crewmatch_vision::HttpVisionClient;

mod config;

use config::{Config, EmptyPool, Resolver};

#[derive(Parser)]
#[command(name = "crewmatch", version, about = "Identify crew members in photographs")]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter (e.g. "info", "crewmatch_core=debug"); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Commands,
}

/// Command-line overrides, applied after the config file and environment.
#[derive(Args, Default)]
struct Overrides {
    /// Roster CSV
    #[arg(long, global = true)]
    roster: Option<PathBuf>,
    /// Presence history CSV
    #[arg(long, global = true)]
    history: Option<PathBuf>,
    /// Reference image directory
    #[arg(long, global = true)]
    sources: Option<PathBuf>,
    /// Photograph directory
    #[arg(long, global = true)]
    images: Option<PathBuf>,
    /// Match records file
    #[arg(long, global = true)]
    matches: Option<PathBuf>,
    /// Pairs output file
    #[arg(long, global = true)]
    pairs: Option<PathBuf>,
    /// Vision service base URL
    #[arg(long, global = true)]
    endpoint: Option<String>,
    /// Images resolved concurrently
    #[arg(long, global = true)]
    workers: Option<usize>,
    /// Behaviour when narrowing empties the candidate pool
    #[arg(long, global = true, value_enum)]
    empty_pool: Option<EmptyPool>,
    /// Name resolution strategy for recognized names
    #[arg(long, global = true, value_enum)]
    resolver: Option<Resolver>,
}

impl Overrides {
    fn apply(self, config: &mut Config) {
        if let Some(v) = self.roster {
            config.roster = v;
        }
        if let Some(v) = self.history {
            config.history = v;
        }
        if let Some(v) = self.sources {
            config.sources = v;
        }
        if let Some(v) = self.images {
            config.images = v;
        }
        if let Some(v) = self.matches {
            config.matches = v;
        }
        if let Some(v) = self.pairs {
            config.pairs = v;
        }
        if let Some(v) = self.endpoint {
            config.endpoint = v;
        }
        if let Some(v) = self.workers {
            config.workers = v;
        }
        if let Some(v) = self.empty_pool {
            config.empty_pool = v;
        }
        if let Some(v) = self.resolver {
            config.resolver = v;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve every photograph, write match records, then regenerate pairs
    Run {
        /// Append to the matches file instead of starting a fresh one
        #[arg(long)]
        append: bool,
    },
    /// Regenerate the pairs file from an existing matches file
    Pairs,
    /// Show how a recognized name would resolve against the roster
    Resolve {
        /// Raw name as returned by recognition
        name: String,
        /// Number of ranked candidates to show
        #[arg(short, long, default_value_t = 5)]
        limit: usize,
    },
    /// Load and cross-check the roster, history and reference gallery
    Check,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match &cli.log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = Config::load(cli.config.as_deref())?;
    cli.overrides.apply(&mut config);
    tracing::debug!(
        endpoint = %config.endpoint,
        workers = config.workers,
        empty_pool = ?config.empty_pool,
        resolver = ?config.resolver,
        "configuration resolved"
    );

    match cli.command {
        Commands::Run { append } => run(&config, append),
        Commands::Pairs => pairs(&config),
        Commands::Resolve { name, limit } => resolve(&config, &name, limit),
        Commands::Check => check(&config),
    }
}

fn run(config: &Config, append: bool) -> Result<()> {
    let roster = load_roster(&config.roster).context("loading roster")?;
    let timeline =
        load_timeline(&config.history, Some(&roster)).context("loading presence history")?;
    let gallery = scan_gallery(&config.sources, Some(&roster)).context("scanning reference images")?;
    let images = scan_corpus(&config.images).context("scanning photographs")?;
    let vision = HttpVisionClient::new(config.client()).context("configuring vision client")?;

    let sink = if append {
        MatchFileSink::open_append(&config.matches)
    } else {
        MatchFileSink::create(&config.matches)
    }
    .context("opening matches file")?;

    let pipeline = ResolutionPipeline::new(&roster, &timeline, &gallery, &vision, config.pipeline());
    let summary = run_corpus(&pipeline, &images, &sink, config.workers)
        .context("writing match records")?;
    drop(sink);

    let records = read_matches(&config.matches).context("re-reading matches file")?;
    let written = save_pairs(&config.pairs, PairEmitter::new(&roster).emit(&records))
        .context("writing pairs")?;

    println!(
        "{} images: {} processed ({} fully resolved), {} skipped",
        summary.images, summary.processed, summary.complete, summary.skipped
    );
    println!(
        "{} faces, {} unresolved, {} comparison calls",
        summary.faces, summary.unresolved_faces, summary.comparisons
    );
    println!("{written} pairs written to {}", config.pairs.display());
    Ok(())
}

fn pairs(config: &Config) -> Result<()> {
    let roster = load_roster(&config.roster).context("loading roster")?;
    let records = read_matches(&config.matches).context("reading matches file")?;
    let written = save_pairs(&config.pairs, PairEmitter::new(&roster).emit(&records))
        .context("writing pairs")?;
    println!(
        "{written} pairs from {} records written to {}",
        records.len(),
        config.pairs.display()
    );
    Ok(())
}

fn resolve(config: &Config, name: &str, limit: usize) -> Result<()> {
    let roster = load_roster(&config.roster).context("loading roster")?;
    let resolver = NameResolver::new(config.resolve_strategy());

    match resolver.resolve(&roster, name) {
        Some(identity) => println!(
            "{name:?} resolves to {} ({}, {})",
            identity.name, identity.gender, identity.agency
        ),
        None => println!("{name:?} does not resolve ({:?})", resolver.strategy()),
    }
    for candidate in resolver.rank(&roster, name).into_iter().take(limit) {
        println!("  {:.3}  {}", candidate.score, candidate.identity.name);
    }
    Ok(())
}

fn check(config: &Config) -> Result<()> {
    let roster = load_roster(&config.roster).context("loading roster")?;
    let timeline =
        load_timeline(&config.history, Some(&roster)).context("loading presence history")?;
    let gallery = scan_gallery(&config.sources, Some(&roster)).context("scanning reference images")?;

    println!("roster: {} identities", roster.len());
    for (gender, count) in roster.gender_counts() {
        println!("  {gender}: {count}");
    }
    println!(
        "history: {} intervals for {} identities",
        timeline.interval_count(),
        timeline.identity_count()
    );

    let without_history: Vec<&str> = roster
        .iter()
        .filter(|id| timeline.windows_of(&id.name).is_empty())
        .map(|id| id.name.as_str())
        .collect();
    let without_image: Vec<&str> = roster
        .iter()
        .filter(|id| !gallery.contains(&id.name))
        .map(|id| id.name.as_str())
        .collect();
    println!("gallery: {} reference images", gallery.len());
    if !without_history.is_empty() {
        println!("no presence history: {}", without_history.join(", "));
    }
    if !without_image.is_empty() {
        println!("no reference image: {}", without_image.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::ScopedEnv;

    fn configured(args: &[&str]) -> (Config, Commands) {
        let cli = Cli::try_parse_from(args).unwrap();
        let mut config = Config::load(cli.config.as_deref()).unwrap();
        cli.overrides.apply(&mut config);
        (config, cli.command)
    }

    #[test]
    fn test_flags_override_env() {
        let _env = ScopedEnv::set(&[
            ("CREWMATCH_WORKERS", "8"),
            ("CREWMATCH_RESOLVER", "jaro-winkler"),
            ("CREWMATCH_ENDPOINT", "http://env.local"),
        ]);
        let (config, command) = configured(&[
            "crewmatch",
            "check",
            "--workers",
            "2",
            "--endpoint",
            "http://flag.local",
            "--empty-pool",
            "skip",
        ]);

        assert!(matches!(command, Commands::Check));
        assert_eq!(config.workers, 2);
        assert_eq!(config.endpoint, "http://flag.local");
        assert_eq!(config.empty_pool, EmptyPool::Skip);
        // No flag given, so the environment value stands.
        assert_eq!(config.resolver, Resolver::JaroWinkler);
    }

    #[test]
    fn test_global_flags_before_subcommand() {
        let _env = ScopedEnv::set(&[]);
        let (config, command) = configured(&[
            "crewmatch",
            "--roster",
            "crew.csv",
            "resolve",
            "Hadfield",
            "--limit",
            "3",
        ]);
        assert_eq!(config.roster, PathBuf::from("crew.csv"));
        assert!(matches!(command, Commands::Resolve { ref name, limit: 3 } if name == "Hadfield"));
    }

    #[test]
    fn test_invalid_flag_value_rejected() {
        assert!(Cli::try_parse_from(["crewmatch", "run", "--empty-pool", "maybe"]).is_err());
    }
}
