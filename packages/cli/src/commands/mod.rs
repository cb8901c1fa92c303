pub mod diff;
pub mod inspect;
pub mod patterns;

pub use diff::{diff, DiffArgs};
pub use inspect::{inspect, InspectArgs};
pub use patterns::{patterns, PatternsArgs};

use anyhow::{Context, Result};
use npb_tree::{rebuild_from_html, Page};
use std::fs;
use std::path::{Path, PathBuf};

/// Read and rebuild a rendered page, resolving `input` against `cwd`
pub(crate) fn load_page(input: &Path, cwd: &str) -> Result<(PathBuf, Page)> {
    let path = PathBuf::from(cwd).join(input);
    let html = fs::read_to_string(&path)
        .with_context(|| format!("Cannot read {}", path.display()))?;
    let page = rebuild_from_html(&html)
        .with_context(|| format!("Cannot rebuild {}", path.display()))?;
    Ok((path, page))
}
