//! Deterministic, offline CLI argument parsing (spec §6 "Input — CLI").
//!
//! Two positional archive paths, an optional third positional output path
//! (default `mappings.txt`), and a handful of engine-tuning flags.

use std::path::PathBuf;

use clap::Parser;

/// Top-level CLI failure. Written out by hand rather than `thiserror`-derived
/// since these are user-facing strings assembled at the call site, not
/// matched on programmatically elsewhere in the workspace.
#[derive(Debug)]
pub enum CliError {
    Usage(String),
    Archive { side: &'static str, path: PathBuf, source: mm_io::IoError },
    Engine(mm_pipeline::EngineError),
    Report { path: PathBuf, source: std::io::Error },
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "usage: {msg}"),
            CliError::Archive { side, path, source } => write!(f, "archive {side} ({}): {source}", path.display()),
            CliError::Engine(e) => write!(f, "pass failed: {e}"),
            CliError::Report { path, source } => write!(f, "writing {}: {source}", path.display()),
        }
    }
}

impl std::error::Error for CliError {}

#[derive(Debug, Parser)]
#[command(name = "mm", about = "Matches obfuscated symbols between two bytecode archives")]
pub struct Args {
    /// Path to archive A (older or partly-known names).
    pub archive_a: PathBuf,

    /// Path to archive B (typically re-obfuscated).
    pub archive_b: PathBuf,

    /// Where to write the mapping file.
    #[arg(default_value = "mappings.txt")]
    pub output: PathBuf,

    /// Override the Vote Collector's minimum-votes promotion criterion.
    #[arg(long)]
    pub min_votes: Option<u32>,

    /// Override the Vote Collector's minimum first/second-place gap.
    #[arg(long)]
    pub min_gap: Option<i64>,

    /// Override the Vote Collector's per-round promotion batch percentage.
    #[arg(long)]
    pub batch_percent: Option<u8>,

    /// Force-enable the TF-IDF+KNN hybrid ranker.
    #[arg(long, conflicts_with = "no_hybrid")]
    pub hybrid: bool,

    /// Force-disable the TF-IDF+KNN hybrid ranker.
    #[arg(long, conflicts_with = "hybrid")]
    pub no_hybrid: bool,

    /// Raise the tracing filter to debug level.
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress the run summary printed to stdout.
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Builds an `EngineConfig` starting from its defaults and applying
    /// whichever overrides were passed on the command line.
    pub fn engine_config(&self) -> mm_pipeline::EngineConfig {
        let mut cfg = mm_pipeline::EngineConfig::default();
        if let Some(v) = self.min_votes {
            cfg.min_votes = v;
        }
        if let Some(g) = self.min_gap {
            cfg.min_gap = g;
        }
        if let Some(b) = self.batch_percent {
            cfg.batch_percent = b;
        }
        if self.no_hybrid {
            cfg.hybrid_enabled = false;
        }
        if self.hybrid {
            cfg.hybrid_enabled = true;
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_defaults_to_mappings_txt() {
        let args = Args::parse_from(["mm", "a.json", "b.json"]);
        assert_eq!(args.output, PathBuf::from("mappings.txt"));
    }

    #[test]
    fn overrides_apply_to_engine_config() {
        let args = Args::parse_from(["mm", "a.json", "b.json", "--min-votes", "5", "--no-hybrid"]);
        let cfg = args.engine_config();
        assert_eq!(cfg.min_votes, 5);
        assert!(!cfg.hybrid_enabled);
    }

    #[test]
    fn defaults_leave_engine_config_untouched() {
        let args = Args::parse_from(["mm", "a.json", "b.json"]);
        let cfg = args.engine_config();
        assert_eq!(cfg, mm_pipeline::EngineConfig::default());
    }
}
