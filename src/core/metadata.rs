//! Build metadata: the version/commit/timestamp snapshot of one invocation.
//!
//! Metadata is read from the repository with libgit2 exactly once per
//! invocation and then passed by reference to every build and publish step,
//! so all artifacts of a run carry identical values.
//!
//! When version-control state is unavailable (no repository, unborn `HEAD`,
//! an unreadable tag) resolution fails with [`ReleaseError::Metadata`]; no
//! placeholder version is ever substituted.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use git2::{DescribeFormatOptions, DescribeOptions, ObjectType, Oid, Repository};

use crate::core::target::TargetPair;
use crate::util::errors::ReleaseError;

/// How the version string was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionStrategy {
    /// A tag points exactly at `HEAD`.
    Tag,
    /// A feature branch is checked out; its name is the version.
    Branch,
    /// `describe --tags --always --dirty` of `HEAD`.
    CommitHash,
}

impl VersionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionStrategy::Tag => "tag",
            VersionStrategy::Branch => "branch",
            VersionStrategy::CommitHash => "commit_hash",
        }
    }
}

impl fmt::Display for VersionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable per-invocation metadata snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildMetadata {
    version: String,
    version_strategy: VersionStrategy,
    commit_hash: String,
    git_branch: String,
    git_tag: Option<String>,
    build_timestamp: String,
    build_host: TargetPair,
}

impl BuildMetadata {
    /// Resolve metadata for the repository containing `repo_root`.
    ///
    /// The timestamp is "now" unless `SOURCE_DATE_EPOCH` pins it.
    pub fn resolve(repo_root: &Path, host: &TargetPair) -> Result<Self, ReleaseError> {
        let epoch = std::env::var("SOURCE_DATE_EPOCH").ok();
        let built_at = source_date_epoch(epoch.as_deref()).unwrap_or_else(Utc::now);
        Self::resolve_at(repo_root, host, built_at)
    }

    /// Resolve metadata with an explicit build time.
    pub fn resolve_at(
        repo_root: &Path,
        host: &TargetPair,
        built_at: DateTime<Utc>,
    ) -> Result<Self, ReleaseError> {
        let fail = |message: String| ReleaseError::Metadata {
            repo: repo_root.to_path_buf(),
            message,
        };

        let repo = Repository::discover(repo_root)
            .map_err(|e| fail(format!("not a git repository: {}", e.message())))?;
        let head = repo
            .head()
            .map_err(|e| fail(format!("HEAD cannot be resolved: {}", e.message())))?;
        let commit = head
            .peel_to_commit()
            .map_err(|e| fail(format!("HEAD is not a commit: {}", e.message())))?;

        let detached = repo.head_detached().unwrap_or(false);
        let git_branch = if detached {
            "HEAD".to_string()
        } else {
            head.shorthand().unwrap_or("HEAD").to_string()
        };

        let git_tag = exact_tag(&repo, commit.id()).map_err(fail)?;

        let (version, version_strategy) = if let Some(tag) = &git_tag {
            (tag.clone(), VersionStrategy::Tag)
        } else if is_feature_branch(&git_branch) {
            (git_branch.clone(), VersionStrategy::Branch)
        } else {
            (describe(&repo).map_err(fail)?, VersionStrategy::CommitHash)
        };

        tracing::debug!(%version, strategy = %version_strategy, "resolved build metadata");

        Ok(BuildMetadata {
            version,
            version_strategy,
            commit_hash: commit.id().to_string(),
            git_branch,
            git_tag,
            build_timestamp: built_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            build_host: host.clone(),
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn version_strategy(&self) -> VersionStrategy {
        self.version_strategy
    }

    pub fn commit(&self) -> &str {
        &self.commit_hash
    }

    pub fn branch(&self) -> &str {
        &self.git_branch
    }

    pub fn tag(&self) -> Option<&str> {
        self.git_tag.as_deref()
    }

    pub fn build_date(&self) -> &str {
        &self.build_timestamp
    }

    /// All keys, sorted. `git_tag` is present only when `HEAD` is tagged.
    pub fn entries(&self) -> BTreeMap<&'static str, String> {
        let mut md = BTreeMap::new();
        md.insert("build_host_arch", self.build_host.arch().to_string());
        md.insert("build_host_os", self.build_host.os().to_string());
        md.insert("build_timestamp", self.build_timestamp.clone());
        md.insert("commit_hash", self.commit_hash.clone());
        md.insert("git_branch", self.git_branch.clone());
        if let Some(tag) = &self.git_tag {
            md.insert("git_tag", tag.clone());
        }
        md.insert("version", self.version.clone());
        md.insert("version_strategy", self.version_strategy.to_string());
        md
    }

    /// `key=value` lines in key order, as printed by `quay version`.
    pub fn render(&self) -> String {
        self.entries()
            .iter()
            .map(|(k, v)| format!("{}={}\n", k, v))
            .collect()
    }

    /// Go linker flags stamping every key, plus the target's `os` / `arch`,
    /// into package `main`.
    pub fn linker_flags(&self, target: &TargetPair) -> String {
        let mut md = self.entries();
        md.insert("os", target.os().to_string());
        md.insert("arch", target.arch().to_string());
        md.iter()
            .map(|(k, v)| format!("-X main.{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// `master`, detached `HEAD` and `release-*` branches are release lines;
/// anything else is a feature branch.
fn is_feature_branch(branch: &str) -> bool {
    !matches!(branch, "master" | "HEAD") && !branch.starts_with("release-")
}

/// The tag pointing exactly at `head`, if any. With several, the greatest
/// name wins.
fn exact_tag(repo: &Repository, head: Oid) -> Result<Option<String>, String> {
    let names = repo
        .tag_names(None)
        .map_err(|e| format!("cannot list tags: {}", e.message()))?;

    let mut matching = Vec::new();
    for name in names.iter().flatten() {
        let object = repo
            .revparse_single(&format!("refs/tags/{}", name))
            .map_err(|e| format!("cannot read tag `{}`: {}", name, e.message()))?;
        match object.peel(ObjectType::Commit) {
            Ok(target) if target.id() == head => matching.push(name.to_string()),
            Ok(_) => {}
            Err(_) => tracing::debug!("tag `{}` does not point at a commit", name),
        }
    }

    matching.sort();
    Ok(matching.pop())
}

/// Equivalent of `git describe --tags --always --dirty`.
fn describe(repo: &Repository) -> Result<String, String> {
    let mut opts = DescribeOptions::new();
    opts.describe_tags().show_commit_oid_as_fallback(true);

    let description = repo
        .describe(&opts)
        .map_err(|e| format!("cannot describe HEAD: {}", e.message()))?;

    let mut format = DescribeFormatOptions::new();
    format.dirty_suffix("-dirty");
    description
        .format(Some(&format))
        .map_err(|e| format!("cannot describe HEAD: {}", e.message()))
}

/// Parse `SOURCE_DATE_EPOCH` (seconds since the Unix epoch).
fn source_date_epoch(value: Option<&str>) -> Option<DateTime<Utc>> {
    let secs = value?.trim().parse::<i64>().ok()?;
    DateTime::from_timestamp(secs, 0)
}
