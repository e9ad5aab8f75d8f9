use std::path::Path;

use anyhow::{Context, Result};

use super::{CONFIG_DIR, CONFIG_FILE};

/// Hand-crafted config template with commented-out keys, so users can see
/// the available knobs without uncommenting section headers.
const CONFIG_TEMPLATE: &str = r#"# ─────────────────────────────────────────────────────────
# Comparison — all fields optional.
# ─────────────────────────────────────────────────────────
[diff]
# threshold = 0.0                   # max allowed diff score in percent (0.0 = exact)
# dimensions = "lenient"            # "lenient" | "strict" (reject size changes)

# ─────────────────────────────────────────────────────────
# Snapshot directories for `redline batch` — all fields optional.
# ─────────────────────────────────────────────────────────
[paths]
# reference = ".redline/reference"
# current = ".redline/current"
# difference = ".redline/difference"
"#;

pub fn config_file_exists() -> bool {
    config_file_exists_in(Path::new(CONFIG_DIR))
}

fn config_file_exists_in(dir: &Path) -> bool {
    dir.join(CONFIG_FILE).exists()
}

pub fn write_gitignore(force: bool) -> Result<()> {
    write_gitignore_in(Path::new(CONFIG_DIR), force)
}

fn write_gitignore_in(dir: &Path, force: bool) -> Result<()> {
    let path = dir.join(".gitignore");
    if !force && path.exists() {
        return Ok(());
    }
    std::fs::write(&path, "current/\ndifference/\n")
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Write the hand-crafted config template (with commented-out sections).
pub fn write_template() -> Result<()> {
    write_template_in(Path::new(CONFIG_DIR))
}

fn write_template_in(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(CONFIG_FILE);
    std::fs::write(&path, CONFIG_TEMPLATE)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
