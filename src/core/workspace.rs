//! Locating the release manifest and the paths derived from it.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Manifest file name.
pub const MANIFEST_NAME: &str = "Release.toml";

/// Top-level output directory, relative to the repository root.
pub const DIST_DIR: &str = "dist";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("could not find `{MANIFEST_NAME}` in `{}` or any parent directory", dir.display())]
    NotFound { dir: PathBuf },
}

/// Search `start` and its ancestors for `Release.toml`.
pub fn find_manifest(start: &Path) -> Result<PathBuf, ManifestError> {
    start
        .ancestors()
        .map(|dir| dir.join(MANIFEST_NAME))
        .find(|candidate| candidate.is_file())
        .ok_or_else(|| ManifestError::NotFound {
            dir: start.to_path_buf(),
        })
}

/// `dist/<binary>/<os>-<arch>/<binary><suffix>` under `root`.
pub fn artifact_path(root: &Path, binary: &str, target_dir: &str, suffix: &str) -> PathBuf {
    root.join(DIST_DIR)
        .join(binary)
        .join(target_dir)
        .join(format!("{}{}", binary, suffix))
}
