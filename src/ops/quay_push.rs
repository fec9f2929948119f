//! Artifact publishing.
//!
//! Publishing a binary directory `dist/<name>`:
//! 1. delete every checksum sidecar left from earlier runs
//! 2. hash each remaining file and write fresh `.sha256`, `.sha1` and `.md5`
//!    sidecars
//! 3. upload binaries and sidecars to the active environment's bucket under
//!    `binaries/<name>/<version>/`
//!
//! Uploads overwrite, so publishing a version twice leaves one object per
//! file. A failed upload aborts the run; earlier uploads stay published.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::core::metadata::BuildMetadata;
use crate::storage::BucketLocation;
use crate::util::context::ReleaseContext;
use crate::util::fs::{files_under, relative_path, remove_file_if_exists, to_slash, write_string};
use crate::util::hash::{file_digests, ChecksumKind};
use crate::util::process::CommandRunner;
use crate::util::shell::Status;

/// What one binary directory's publish uploaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushReport {
    pub binary: String,
    /// Whether the objects were made publicly readable.
    pub public: bool,
    /// Destination URIs, in upload order.
    pub uploaded: Vec<String>,
}

/// Publish `dist/<name>`.
pub fn push_one(
    ctx: &ReleaseContext,
    runner: &mut dyn CommandRunner,
    metadata: &BuildMetadata,
    name: &str,
) -> Result<PushReport> {
    let spec = ctx.config().require(name)?;
    let bucket = ctx.bucket()?;

    let dir = ctx.dist_dir().join(name);
    if !dir.is_dir() {
        bail!(
            "no artifacts for `{}` in {}; run `quay build {}` first",
            name,
            dir.display(),
            name
        );
    }
    push_dir(ctx, runner, metadata, bucket, name, spec.is_release(), &dir)
}

/// Publish every subdirectory of `dist/`, skipping non-directory entries.
///
/// A directory that names no configured binary is still published, but
/// privately, since its release visibility is unknown.
pub fn push_all(
    ctx: &ReleaseContext,
    runner: &mut dyn CommandRunner,
    metadata: &BuildMetadata,
) -> Result<Vec<PushReport>> {
    let bucket = ctx.bucket()?;
    let dist = ctx.dist_dir();

    let mut entries: Vec<_> = fs::read_dir(&dist)
        .with_context(|| format!("nothing to publish: cannot read {}", dist.display()))?
        .collect::<Result<_, _>>()
        .with_context(|| format!("failed to read directory: {}", dist.display()))?;
    entries.sort_by_key(|entry| entry.file_name());

    let mut reports = Vec::new();
    for entry in entries {
        let path = entry.path();
        if !path.is_dir() {
            tracing::debug!("skipping non-directory {}", path.display());
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let public = match ctx.config().get(&name) {
            Some(spec) => spec.is_release(),
            None => {
                ctx.shell().warn(format!(
                    "`{}` is not a configured binary; publishing it privately",
                    name
                ));
                false
            }
        };
        reports.push(push_dir(ctx, runner, metadata, bucket, &name, public, &path)?);
    }
    Ok(reports)
}

fn push_dir(
    ctx: &ReleaseContext,
    runner: &mut dyn CommandRunner,
    metadata: &BuildMetadata,
    bucket: &BucketLocation,
    name: &str,
    public: bool,
    dir: &Path,
) -> Result<PushReport> {
    ctx.shell().status(
        Status::Publishing,
        format!(
            "{} {} to {} ({})",
            name,
            metadata.version(),
            bucket,
            ctx.environment()
        ),
    );

    let removed = remove_checksums(dir)?;
    if removed > 0 {
        ctx.shell().verbose(
            Status::Removed,
            format!("{} stale checksum file(s) in {}", removed, dir.display()),
        );
    }

    for binary in files_under(dir)? {
        write_checksums(&binary)?;
    }

    let mut report = PushReport {
        binary: name.to_string(),
        public,
        uploaded: Vec::new(),
    };
    for file in files_under(dir)? {
        let relative = to_slash(&relative_path(dir, &file));
        let key = BucketLocation::object_key(name, metadata.version(), &relative);
        bucket.upload(runner, &file, &key, public)?;

        let destination = bucket.destination(&key);
        ctx.shell().verbose(Status::Uploaded, &destination);
        report.uploaded.push(destination);
    }

    ctx.shell().status(
        Status::Uploaded,
        format!("{} file(s) for {}", report.uploaded.len(), name),
    );
    Ok(report)
}

fn is_checksum(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(ChecksumKind::from_extension)
        .is_some()
}

/// Delete every checksum sidecar below `dir`; returns how many were removed.
pub fn remove_checksums(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for file in files_under(dir)? {
        if is_checksum(&file) {
            remove_file_if_exists(&file)?;
            removed += 1;
        }
    }
    Ok(removed)
}

/// Sidecar path for an artifact: `<file>.<extension>`.
pub fn checksum_path(artifact: &Path, kind: ChecksumKind) -> PathBuf {
    let mut name = artifact.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(kind.extension());
    artifact.with_file_name(name)
}

/// Hash `artifact` and write `<hex>  <file name>` to one sidecar per
/// [`ChecksumKind`].
pub fn write_checksums(artifact: &Path) -> Result<Vec<PathBuf>> {
    let file_name = artifact
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let mut sidecars = Vec::new();
    for (kind, digest) in file_digests(artifact)? {
        let sidecar = checksum_path(artifact, kind);
        write_string(&sidecar, &format!("{}  {}\n", digest, file_name))?;
        sidecars.push(sidecar);
    }
    Ok(sidecars)
}

/// The digest recorded in a sidecar.
pub fn read_checksum(sidecar: &Path) -> Result<String> {
    let contents = fs::read_to_string(sidecar)
        .with_context(|| format!("failed to read checksum: {}", sidecar.display()))?;
    contents
        .split_whitespace()
        .next()
        .map(str::to_string)
        .with_context(|| format!("empty checksum file: {}", sidecar.display()))
}
