//! Test fixtures for common test scenarios.
//!
//! [`ReleaseFixture`] is a throwaway repository: a `Release.toml`, one git
//! commit, and a local directory standing in for the `dev` bucket.

use std::path::{Path, PathBuf};

use git2::{Oid, Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;
use url::Url;

use crate::core::metadata::BuildMetadata;
use crate::core::target::TargetPair;
use crate::core::workspace::{artifact_path, MANIFEST_NAME};
use crate::util::context::ReleaseContext;
use crate::util::shell::Shell;

/// A three-binary project: one dev-only tool and two release binaries, one
/// of them built for both the musl and glibc Linux flavors.
pub const SEARCHLIGHT_MANIFEST: &str = r#"
[project]
sources = ["apis", "client", "cmd", "pkg", "plugins", "test"]
generate = ["cmd/searchlight/main.go"]
install = ["./cmd/..."]
e2e = "test/e2e"
revendor = ["glide", "slow"]

[buckets]
prod = "gs://appscode-cdn"
dev = "gs://appscode-dev"

[[binary]]
name = "searchlight"
targets = ["alpine/amd64"]

[[binary]]
name = "hostfacts"
release = true
targets = ["linux/amd64"]

[[binary]]
name = "hyperalert"
release = true
targets = ["alpine/amd64", "linux/amd64"]
"#;

/// Initialize a repository whose unborn HEAD points at `branch`.
pub fn init_git_repo(path: &Path, branch: &str) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head(branch);
    Repository::init_opts(path, &opts).unwrap()
}

/// Write `name` in the work tree and commit it on top of HEAD.
pub fn commit_file(repo: &Repository, name: &str, content: &str) -> Oid {
    let workdir = repo.workdir().unwrap();
    std::fs::write(workdir.join(name), content).unwrap();

    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

    let sig = Signature::now("Quay Tests", "tests@quay.invalid").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<_> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, &format!("add {}", name), &tree, &parents)
        .unwrap()
}

/// Lightweight tag on the current HEAD commit.
pub fn tag_head(repo: &Repository, name: &str) {
    let head = repo.head().unwrap().peel(git2::ObjectType::Commit).unwrap();
    repo.tag_lightweight(name, &head, false).unwrap();
}

/// A committed project on `master` with a local `dev` bucket.
pub struct ReleaseFixture {
    dir: TempDir,
    bucket: TempDir,
}

impl ReleaseFixture {
    /// [`SEARCHLIGHT_MANIFEST`] with `dev` pointing at the local bucket.
    pub fn new() -> Self {
        let bucket = TempDir::new().unwrap();
        let url = Url::from_directory_path(bucket.path()).unwrap();
        let manifest = SEARCHLIGHT_MANIFEST.replace("gs://appscode-dev", url.as_str());
        Self::create(&manifest, bucket)
    }

    pub fn with_manifest(manifest: &str) -> Self {
        Self::create(manifest, TempDir::new().unwrap())
    }

    fn create(manifest: &str, bucket: TempDir) -> Self {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(MANIFEST_NAME), manifest).unwrap();

        let repo = init_git_repo(dir.path(), "master");
        commit_file(&repo, ".gitignore", "/dist/\n");
        commit_file(&repo, MANIFEST_NAME, manifest);

        ReleaseFixture { dir, bucket }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Directory behind the `dev` bucket's `file://` URL.
    pub fn bucket_path(&self) -> &Path {
        self.bucket.path()
    }

    /// Context for the `dev` environment on a linux/amd64 host.
    pub fn context(&self) -> ReleaseContext {
        self.context_for("dev")
    }

    pub fn context_for(&self, environment: &str) -> ReleaseContext {
        ReleaseContext::load(&self.root().join(MANIFEST_NAME), environment)
            .unwrap()
            .with_host(TargetPair::new("linux", "amd64"))
            .with_toolchain("go")
            .with_shell(Shell::quiet())
    }

    pub fn metadata(&self) -> BuildMetadata {
        BuildMetadata::resolve(self.root(), &TargetPair::new("linux", "amd64")).unwrap()
    }

    /// Drop a fake binary at `dist/<binary>/<target_dir>/<binary>`.
    pub fn write_artifact(&self, binary: &str, target_dir: &str, contents: &[u8]) -> PathBuf {
        let path = artifact_path(self.root(), binary, target_dir, "");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, contents).unwrap();
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_is_committed_repo() {
        let fx = ReleaseFixture::new();
        let repo = Repository::open(fx.root()).unwrap();
        assert_eq!(repo.head().unwrap().shorthand(), Some("master"));
        assert!(fx.root().join(MANIFEST_NAME).is_file());
    }

    #[test]
    fn test_dev_bucket_is_local() {
        let fx = ReleaseFixture::new();
        let ctx = fx.context();
        let bucket = ctx.bucket().unwrap();
        assert_eq!(bucket.url().to_file_path().unwrap(), fx.bucket_path());
    }
}
