use anyhow::{Context, Result};
use clap::ValueEnum;
use redline_diff::{DiffOptions, DiffOutput, DimensionPolicy};

use super::{Config, PathsConfig, load, validate_threshold};
use crate::cli::DiffArgs;
use crate::compare::within_threshold;

/// Values extracted from the CLI that participate in the merge.
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub threshold: Option<f64>,
    pub dimensions: Option<DimensionPolicy>,
}

impl From<DiffArgs> for CliOverrides {
    fn from(args: DiffArgs) -> Self {
        Self {
            threshold: args.threshold,
            dimensions: args.dimensions,
        }
    }
}

/// Values read from `REDLINE_*` environment variables.
#[derive(Debug, Default)]
pub struct EnvOverrides {
    pub threshold: Option<f64>,
    pub dimensions: Option<DimensionPolicy>,
}

impl EnvOverrides {
    pub fn from_env() -> Result<Self> {
        Self::parse(
            std::env::var("REDLINE_DIFF_THRESHOLD").ok().as_deref(),
            std::env::var("REDLINE_DIMENSIONS").ok().as_deref(),
        )
    }

    fn parse(threshold: Option<&str>, dimensions: Option<&str>) -> Result<Self> {
        let threshold = threshold
            .map(|v| v.parse::<f64>())
            .transpose()
            .context("REDLINE_DIFF_THRESHOLD must be a valid float")?;
        let dimensions = dimensions
            .map(|v| DimensionPolicy::from_str(v, true).map_err(anyhow::Error::msg))
            .transpose()
            .context("REDLINE_DIMENSIONS must be \"lenient\" or \"strict\"")?;
        Ok(Self {
            threshold,
            dimensions,
        })
    }
}

/// Fully resolved config after CLI > env > file > defaults merge.
#[derive(Debug)]
pub struct ResolvedRunConfig {
    pub diff_threshold: f64,
    pub dimension_policy: DimensionPolicy,
    pub paths: PathsConfig,
}

impl ResolvedRunConfig {
    pub fn new(cli: CliOverrides) -> Result<Self> {
        let file_config = load()?;
        let env = EnvOverrides::from_env()?;
        Self::merge(file_config, env, cli)
    }

    fn merge(file: Config, env: EnvOverrides, cli: CliOverrides) -> Result<Self> {
        let diff_threshold = cli
            .threshold
            .or(env.threshold)
            .unwrap_or(file.diff.threshold);
        validate_threshold(diff_threshold).map_err(|e| anyhow::anyhow!("{e}"))?;

        let dimension_policy = cli
            .dimensions
            .or(env.dimensions)
            .unwrap_or(file.diff.dimensions);

        Ok(Self {
            diff_threshold,
            dimension_policy,
            paths: file.paths,
        })
    }

    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions {
            dimension_policy: self.dimension_policy,
        }
    }

    pub fn passes(&self, output: &DiffOutput) -> bool {
        within_threshold(output, self.diff_threshold)
    }
}
