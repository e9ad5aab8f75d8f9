pub mod resolve;
pub mod template;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use redline_diff::DimensionPolicy;
use serde::Deserialize;

pub use self::resolve::{CliOverrides, ResolvedRunConfig};
pub use self::template::{config_file_exists, write_gitignore, write_template};

pub(crate) const CONFIG_DIR: &str = ".redline";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiffConfig {
    /// Maximum allowed diff score in percent. Comparisons with score <= threshold pass.
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub dimensions: DimensionPolicy,
}

pub fn validate_threshold(v: f64) -> Result<f64, String> {
    if !(0.0..=100.0).contains(&v) {
        return Err(format!("threshold must be between 0 and 100, got {v}"));
    }
    Ok(v)
}

/// Snapshot directories used by `redline batch`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_reference")]
    pub reference: PathBuf,
    #[serde(default = "default_current")]
    pub current: PathBuf,
    #[serde(default = "default_difference")]
    pub difference: PathBuf,
}

fn default_reference() -> PathBuf {
    Path::new(CONFIG_DIR).join("reference")
}

fn default_current() -> PathBuf {
    Path::new(CONFIG_DIR).join("current")
}

fn default_difference() -> PathBuf {
    Path::new(CONFIG_DIR).join("difference")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            reference: default_reference(),
            current: default_current(),
            difference: default_difference(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub diff: DiffConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

impl Config {
    /// Validate semantic constraints that serde cannot express.
    fn validate(&self) -> Result<()> {
        validate_threshold(self.diff.threshold).map_err(|e| anyhow::anyhow!("diff.{e}"))?;

        let PathsConfig {
            reference,
            current,
            difference,
        } = &self.paths;
        if reference == current || reference == difference || current == difference {
            bail!(
                "paths.reference, paths.current and paths.difference must be distinct \
                 (got {}, {}, {})",
                reference.display(),
                current.display(),
                difference.display(),
            );
        }

        Ok(())
    }
}

/// Load `.redline/config.toml`, falling back to defaults when it is absent.
pub fn load() -> Result<Config> {
    load_from(&Path::new(CONFIG_DIR).join(CONFIG_FILE))
}

pub fn load_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: Config =
        toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(&dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.diff.threshold, 0.0);
        assert_eq!(config.diff.dimensions, DimensionPolicy::Lenient);
        assert_eq!(config.paths, PathsConfig::default());
    }

    #[test]
    fn parses_diff_and_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            "[diff]\nthreshold = 1.5\ndimensions = \"strict\"\n\n[paths]\nreference = \"baseline\"\n",
        );
        let config = load_from(&path).unwrap();
        assert_eq!(config.diff.threshold, 1.5);
        assert_eq!(config.diff.dimensions, DimensionPolicy::Strict);
        assert_eq!(config.paths.reference, PathBuf::from("baseline"));
        assert_eq!(config.paths.current, default_current());
    }

    #[test]
    fn threshold_out_of_range_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[diff]\nthreshold = 150.0\n");
        let err = load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("diff.threshold must be between 0 and 100"));
    }

    #[test]
    fn overlapping_paths_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[paths]\nreference = \"a\"\ncurrent = \"a\"\n");
        assert!(load_from(&path).is_err());
    }

    #[test]
    fn unknown_dimension_policy_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[diff]\ndimensions = \"sloppy\"\n");
        assert!(load_from(&path).is_err());
    }
}
