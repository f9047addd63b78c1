//! Finding and reading the layout file.

use anyhow::{bail, Context, Result};
use marquee_core_layout::LayoutDescription;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::config_dirs;

pub const LAYOUT_FILENAME: &str = "layout.toml";

/// Locate the layout file.
///
/// An explicit path (command line, then `layout.file` from the config) must
/// exist. Otherwise the config directories are searched.
pub fn find_layout(explicit: Option<&Path>, configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit.or(configured) {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        bail!("Layout file not found: {}", path.display());
    }

    let candidates: Vec<PathBuf> = config_dirs()
        .into_iter()
        .map(|dir| dir.join(LAYOUT_FILENAME))
        .collect();
    candidates
        .iter()
        .find(|path| path.is_file())
        .cloned()
        .with_context(|| {
            let searched: Vec<String> = candidates.iter().map(|p| p.display().to_string()).collect();
            format!("No {} found (searched: {})", LAYOUT_FILENAME, searched.join(", "))
        })
}

/// Parse a layout and resolve relative asset paths against its directory.
pub fn load_layout(path: &Path) -> Result<LayoutDescription> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read layout file: {}", path.display()))?;
    let mut description = parse_layout(&content)
        .with_context(|| format!("Failed to parse layout file: {}", path.display()))?;

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    description.rebase(base);
    tracing::info!(
        "Loaded layout {} ({} sidebar entries)",
        path.display(),
        description.items.len()
    );
    Ok(description)
}

pub fn parse_layout(content: &str) -> Result<LayoutDescription> {
    Ok(toml::from_str(content)?)
}
