//! Command-line arguments and run configuration
//!
//! Settings resolve in priority order: command line > environment > TOML
//! config file > built-in default. The file is optional and only fills
//! in what the higher layers left unset.

use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Output directory used when no other layer sets one
pub const DEFAULT_OUT: &str = "graphs";

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "cuegraph")]
#[command(about = "Convert cue sheets into Music Ontology entity graphs")]
#[command(version)]
pub struct Args {
    /// Cue files to convert, or directories to scan with --recursive
    #[arg(required = true, value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Recursively scan input directories for .cue files
    #[arg(short, long)]
    pub recursive: bool,

    /// Candidate media root; repeat for multiple roots (longest prefix wins)
    #[arg(short = 'R', long = "root", env = "CUEGRAPH_ROOT", value_name = "DIR")]
    pub roots: Vec<PathBuf>,

    /// Also publish a namespace variant under this branch name; repeatable
    #[arg(short, long = "branch", value_name = "NAME")]
    pub branches: Vec<String>,

    /// Output directory for graphs and peak artifacts
    #[arg(short, long, env = "CUEGRAPH_OUT", value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Emit the private graph (raw local file paths) at this path prefix
    #[arg(long, value_name = "PREFIX")]
    pub private: Option<PathBuf>,

    /// Skip MusicBrainz enrichment
    #[arg(long)]
    pub no_enrich: bool,

    /// TOML configuration file
    #[arg(short, long, env = "CUEGRAPH_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Optional settings from a TOML config file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub roots: Vec<PathBuf>,
    #[serde(default)]
    pub branches: Vec<String>,
    pub out: Option<PathBuf>,
    pub private: Option<PathBuf>,
    pub enrich: Option<bool>,
}

impl FileConfig {
    fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&text).map_err(|e| {
            Error::Config(format!("invalid config file {}: {}", path.display(), e))
        })
    }
}

/// Fully resolved run configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub inputs: Vec<PathBuf>,
    pub recursive: bool,
    pub roots: Vec<PathBuf>,
    pub branches: Vec<String>,
    pub out: PathBuf,
    pub private: Option<PathBuf>,
    pub enrich: bool,
}

impl Config {
    /// Merge the argument layers and validate the result
    ///
    /// At least one media root must come from somewhere; branch names must
    /// be usable as a single path segment.
    pub fn resolve(args: Args) -> Result<Self> {
        let file = match &args.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        let roots = if args.roots.is_empty() {
            file.roots
        } else {
            args.roots
        };
        if roots.is_empty() {
            return Err(Error::Config(
                "at least one media root is required (--root, CUEGRAPH_ROOT, or roots in the \
                 config file)"
                    .to_string(),
            ));
        }

        let branches = if args.branches.is_empty() {
            file.branches
        } else {
            args.branches
        };
        for branch in &branches {
            if branch.is_empty() || branch.contains('/') || branch.contains(char::is_whitespace) {
                return Err(Error::InvalidInput(format!(
                    "branch name {branch:?} must be a single non-empty path segment"
                )));
            }
        }

        Ok(Config {
            inputs: args.inputs,
            recursive: args.recursive,
            roots,
            branches,
            out: args
                .out
                .or(file.out)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT)),
            private: args.private.or(file.private),
            enrich: if args.no_enrich {
                false
            } else {
                file.enrich.unwrap_or(true)
            },
        })
    }
}
