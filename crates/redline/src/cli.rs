use clap::{Args, Parser, Subcommand};
use redline_diff::DimensionPolicy;

use crate::config;

fn parse_threshold(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{e}"))?;
    config::validate_threshold(v)
}

#[derive(Parser)]
#[command(
    name = "redline",
    about = "Pixel diff for visual regression testing: changes in red, the rest in gray"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Comparison settings shared by `diff` and `batch` (override config).
#[derive(Args, Clone, Debug, Default)]
pub struct DiffArgs {
    /// Max allowed diff score in percent (0-100). Comparisons within threshold pass.
    #[arg(long, value_parser = parse_threshold)]
    pub threshold: Option<f64>,
    /// How to treat images whose dimensions differ
    #[arg(long, value_enum)]
    pub dimensions: Option<DimensionPolicy>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create .redline/config.toml with default settings
    Init {
        /// Overwrite existing config and gitignore
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Compare two images and write the highlighted diff (exit 0/1)
    Diff {
        /// Baseline image path, or `-` for stdin
        first: String,
        /// Candidate image path, or `-` for stdin
        second: String,
        /// Where to write the diff PNG (`-` for stdout)
        #[arg(long, short = 'o')]
        output: Option<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        diff: DiffArgs,
    },

    /// Compare every current snapshot against its reference (exit 0/1)
    Batch {
        /// Only compare snapshots whose name contains PATTERN (case-insensitive)
        #[arg(long, short = 'f')]
        filter: Option<String>,
        /// Number of comparisons to run concurrently
        #[arg(long, short = 'p', default_value_t = 4)]
        parallel: usize,
        #[command(flatten)]
        diff: DiffArgs,
    },
}
