//! Release context: everything an invocation needs, built once in `main`.
//!
//! The context owns the parsed manifest, the active environment, the host
//! pair and toolchain location, and the shell. It is passed by shared
//! reference to every operation and never mutated after construction.

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::core::manifest::{BucketMap, BuildConfiguration, Manifest, ProjectLayout};
use crate::core::target::TargetPair;
use crate::core::workspace::DIST_DIR;
use crate::storage::BucketLocation;
use crate::util::errors::ReleaseError;
use crate::util::process::find_executable;
use crate::util::shell::Shell;

/// Environment used when none is given.
pub const DEFAULT_ENVIRONMENT: &str = "dev";

#[derive(Debug)]
pub struct ReleaseContext {
    manifest: Manifest,
    environment: String,
    host: TargetPair,
    toolchain: PathBuf,
    shell: Shell,
}

impl ReleaseContext {
    /// Create a context with host and toolchain detected from the
    /// environment.
    pub fn new(manifest: Manifest, environment: impl Into<String>) -> Self {
        ReleaseContext {
            manifest,
            environment: environment.into(),
            host: TargetPair::host(),
            toolchain: locate_go(|key| std::env::var(key).ok()),
            shell: Shell::default(),
        }
    }

    /// Load the manifest at `path` and build a context around it.
    pub fn load(path: &Path, environment: impl Into<String>) -> Result<Self> {
        Ok(Self::new(Manifest::load(path)?, environment))
    }

    pub fn with_host(mut self, host: TargetPair) -> Self {
        self.host = host;
        self
    }

    pub fn with_toolchain(mut self, toolchain: impl Into<PathBuf>) -> Self {
        self.toolchain = toolchain.into();
        self
    }

    pub fn with_shell(mut self, shell: Shell) -> Self {
        self.shell = shell;
        self
    }

    /// Repository root.
    pub fn root(&self) -> &Path {
        self.manifest.root()
    }

    /// Top-level output directory.
    pub fn dist_dir(&self) -> PathBuf {
        self.root().join(DIST_DIR)
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn config(&self) -> &BuildConfiguration {
        self.manifest.config()
    }

    pub fn buckets(&self) -> &BucketMap {
        self.manifest.buckets()
    }

    pub fn layout(&self) -> &ProjectLayout {
        self.manifest.layout()
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// The bucket for the active environment.
    pub fn bucket(&self) -> Result<&BucketLocation, ReleaseError> {
        self.buckets().get(&self.environment)
    }

    pub fn host(&self) -> &TargetPair {
        &self.host
    }

    /// The `go` executable.
    pub fn toolchain(&self) -> &Path {
        &self.toolchain
    }

    pub fn shell(&self) -> &Shell {
        &self.shell
    }
}

/// `$GOROOT/bin/go` when `GOROOT` is set, else `go` from `PATH`.
fn locate_go(lookup: impl Fn(&str) -> Option<String>) -> PathBuf {
    let exe = format!("go{}", std::env::consts::EXE_SUFFIX);
    if let Some(goroot) = lookup("GOROOT").filter(|v| !v.is_empty()) {
        return PathBuf::from(goroot).join("bin").join(exe);
    }
    find_executable("go").unwrap_or_else(|| PathBuf::from(exe))
}
