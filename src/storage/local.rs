//! `file://` buckets: plain directory copies.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, Result};
use url::Url;

use crate::util::errors::ReleaseError;

pub(super) fn upload(base: &Url, local: &Path, key: &str) -> Result<()> {
    let root = base
        .to_file_path()
        .map_err(|_| anyhow!("bucket `{}` is not a local path", base))?;

    let dest = key.split('/').fold(root, |path, part| path.join(part));
    let failed = |source| ReleaseError::PublishIo {
        file: local.to_path_buf(),
        destination: dest.display().to_string(),
        source,
    };

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(failed)?;
    }
    fs::copy(local, &dest).map_err(failed)?;
    Ok(())
}
