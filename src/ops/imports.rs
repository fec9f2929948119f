//! Go import-block ungrouping.
//!
//! `goimports` keeps blank-line separated import groups as they are. Before
//! formatting, every `import ( ... )` block is collapsed to a single group
//! so `goimports` can re-sort it into the canonical stdlib / third-party
//! layout.

use std::path::Path;
use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::Regex;
use walkdir::WalkDir;

use crate::util::fs::{read_to_string, write_string};

static BEGIN_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^import \((.*)$").expect("valid regex")
});
static END_IMPORT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\)\s*").expect("valid regex"));

/// Ungroup imports in every `.go` file under `paths` (files or directories).
///
/// Returns the number of files rewritten. Missing paths are skipped.
pub fn ungroup_go_imports(paths: &[impl AsRef<Path>]) -> Result<usize> {
    let mut changed = 0;
    for path in paths {
        let path = path.as_ref();
        if path.is_file() {
            changed += ungroup_file(path)? as usize;
            continue;
        }
        if !path.is_dir() {
            tracing::debug!("skipping missing source root {}", path.display());
            continue;
        }
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry =
                entry.with_context(|| format!("failed to walk directory: {}", path.display()))?;
            let is_go = entry.path().extension().is_some_and(|ext| ext == "go");
            if entry.file_type().is_file() && is_go {
                changed += ungroup_file(entry.path())? as usize;
            }
        }
    }
    Ok(changed)
}

fn ungroup_file(path: &Path) -> Result<bool> {
    let source = read_to_string(path)?;
    let ungrouped = ungroup_source(&source);
    if ungrouped == source {
        return Ok(false);
    }
    tracing::debug!("ungrouped imports in {}", path.display());
    write_string(path, &ungrouped)?;
    Ok(true)
}

/// Drop blank lines inside `import ( ... )` blocks, keeping everything else
/// byte for byte.
pub fn ungroup_source(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut in_block = false;

    for line in source.split_inclusive('\n') {
        let trimmed = line.trim();
        if in_block {
            if trimmed.is_empty() {
                continue;
            }
            if END_IMPORT.is_match(trimmed) {
                in_block = false;
            }
        } else if let Some(caps) = BEGIN_IMPORT.captures(trimmed) {
            // `import ("fmt")` opens and closes on one line
            in_block = !caps[1].contains(')');
        }
        out.push_str(line);
    }
    out
}
