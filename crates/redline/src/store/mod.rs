use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::warn;

use crate::config::PathsConfig;

/// `<dir>/<id>.png`
pub fn file_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{id}.png"))
}

pub fn reference_path(paths: &PathsConfig, id: &str) -> PathBuf {
    file_path(&paths.reference, id)
}

pub fn current_path(paths: &PathsConfig, id: &str) -> PathBuf {
    file_path(&paths.current, id)
}

pub fn difference_path(paths: &PathsConfig, id: &str) -> PathBuf {
    file_path(&paths.difference, id)
}

/// Collect every `.png` under `dir` as an ID (relative path without
/// extension, `/`-separated).
pub fn list_ids(dir: &Path) -> Result<BTreeSet<String>> {
    let mut ids = BTreeSet::new();
    if !dir.is_dir() {
        return Ok(ids);
    }
    let pattern = format!("{}/**/*.png", glob::Pattern::escape(&dir.to_string_lossy()));
    let entries = glob::glob(&pattern)
        .with_context(|| format!("Invalid snapshot directory {}", dir.display()))?;
    for entry in entries {
        match entry {
            Ok(path) => {
                if let Ok(rel) = path.strip_prefix(dir) {
                    let id = rel.with_extension("");
                    let id: Vec<_> = id
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect();
                    ids.insert(id.join("/"));
                }
            }
            Err(e) => warn!(error = %e, "unreadable snapshot entry"),
        }
    }
    Ok(ids)
}

/// Case-insensitive substring match; a trailing `.png` on the pattern is ignored.
pub fn matches_filter(id: &str, filter: Option<&str>) -> bool {
    filter
        .map(|pat| {
            let pat = pat.strip_suffix(".png").unwrap_or(pat);
            id.to_lowercase().contains(&pat.to_lowercase())
        })
        .unwrap_or(true)
}

/// Remove stale difference images for the given IDs.
pub fn clean_difference_files(paths: &PathsConfig, ids: &[String]) {
    for id in ids {
        let _ = std::fs::remove_file(difference_path(paths, id));
    }
}

/// Remove every file from the difference directory.
pub fn clear_difference_dir(paths: &PathsConfig) {
    let dir = &paths.difference;
    if dir.exists() {
        let _ = std::fs::remove_dir_all(dir);
        let _ = std::fs::create_dir_all(dir);
    }
}
