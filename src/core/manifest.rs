//! `Release.toml` parsing and schema.
//!
//! The manifest declares the build matrix (`[[binary]]`, in build order),
//! the publish buckets per environment (`[buckets]`) and the project layout
//! used by the pass-through steps (`[project]`). It is parsed once at startup
//! into immutable values; nothing mutates them afterwards.
//!
//! ```toml
//! [project]
//! sources = ["cmd", "pkg"]
//!
//! [buckets]
//! prod = "gs://appscode-cdn"
//! dev = "gs://appscode-dev"
//!
//! [[binary]]
//! name = "hostfacts"
//! release = true
//! targets = ["linux/amd64"]
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::target::TargetPair;
use crate::storage::BucketLocation;
use crate::util::errors::ReleaseError;

/// How a binary is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryKind {
    #[default]
    Go,
}

/// One named binary's build configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinarySpec {
    name: String,
    kind: BinaryKind,
    targets: Option<Vec<TargetPair>>,
    release: bool,
    version_stamp: bool,
    main: String,
}

impl BinarySpec {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> BinaryKind {
        self.kind
    }

    /// Declared targets; `None` means "the host's own pair".
    pub fn declared_targets(&self) -> Option<&[TargetPair]> {
        self.targets.as_deref()
    }

    /// The pairs to build, in declaration order.
    pub fn build_targets(&self, host: &TargetPair) -> Vec<TargetPair> {
        match &self.targets {
            Some(targets) => targets.clone(),
            None => vec![host.clone()],
        }
    }

    /// Whether published artifacts are publicly readable.
    pub fn is_release(&self) -> bool {
        self.release
    }

    /// Whether build metadata is stamped into the binary.
    pub fn version_stamp(&self) -> bool {
        self.version_stamp
    }

    /// Go package compiled for this binary.
    pub fn main_package(&self) -> &str {
        &self.main
    }
}

/// The ordered build matrix.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConfiguration {
    binaries: Vec<BinarySpec>,
}

impl BuildConfiguration {
    pub fn get(&self, name: &str) -> Option<&BinarySpec> {
        self.binaries.iter().find(|b| b.name == name)
    }

    /// Look up a binary, failing with a configuration error.
    pub fn require(&self, name: &str) -> Result<&BinarySpec, ReleaseError> {
        self.get(name).ok_or_else(|| ReleaseError::UnknownBinary {
            name: name.to_string(),
            configured: self.names().collect::<Vec<_>>().join(", "),
        })
    }

    /// Binaries in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &BinarySpec> {
        self.binaries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.binaries.iter().map(|b| b.name.as_str())
    }

}

/// Environment name to publish destination.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketMap {
    buckets: BTreeMap<String, BucketLocation>,
}

impl BucketMap {
    pub fn get(&self, environment: &str) -> Result<&BucketLocation, ReleaseError> {
        self.buckets
            .get(environment)
            .ok_or_else(|| ReleaseError::UnknownEnvironment {
                name: environment.to_string(),
                known: self.environments().collect::<Vec<_>>().join(", "),
            })
    }

    pub fn environments(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }
}

/// Source layout used by the generate / format / lint / test steps.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectLayout {
    /// Source roots, relative to the repository root.
    pub sources: Vec<String>,

    /// Files passed to `go generate`.
    pub generate: Vec<String>,

    /// Packages passed to `go install`.
    pub install: Vec<String>,

    /// Directory holding the end-to-end suite.
    pub e2e: String,

    /// Command that refreshes vendored dependencies.
    pub revendor: Vec<String>,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        ProjectLayout {
            sources: vec!["cmd".to_string(), "pkg".to_string()],
            generate: Vec::new(),
            install: vec!["./cmd/...".to_string()],
            e2e: "test/e2e".to_string(),
            revendor: vec!["go".to_string(), "mod".to_string(), "vendor".to_string()],
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawManifest {
    #[serde(default)]
    project: ProjectLayout,
    #[serde(default)]
    buckets: BTreeMap<String, String>,
    #[serde(default, rename = "binary")]
    binaries: Vec<RawBinary>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct RawBinary {
    name: String,
    #[serde(default)]
    kind: BinaryKind,
    #[serde(default)]
    release: bool,
    #[serde(default = "default_true")]
    version_stamp: bool,
    main: Option<String>,
    targets: Option<Vec<String>>,
}

fn default_true() -> bool {
    true
}

/// The parsed `Release.toml`.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    config: BuildConfiguration,
    buckets: BucketMap,
    layout: ProjectLayout,
}

impl Manifest {
    /// Load and validate a manifest from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;
        Ok(Self::parse(&contents, path)?)
    }

    /// Parse and validate manifest text; `path` is used for the repository
    /// root and for error messages.
    pub fn parse(contents: &str, path: &Path) -> Result<Self, ReleaseError> {
        let invalid = |message: String| ReleaseError::InvalidManifest {
            path: path.to_path_buf(),
            message,
        };

        let raw: RawManifest = toml::from_str(contents).map_err(|e| invalid(e.to_string()))?;

        if raw.project.sources.is_empty() {
            return Err(invalid("`project.sources` must name at least one source root".into()));
        }

        if raw.buckets.is_empty() {
            return Err(invalid("`[buckets]` must define at least one environment".into()));
        }
        let mut buckets = BTreeMap::new();
        for (env, uri) in raw.buckets {
            let location = uri
                .parse::<BucketLocation>()
                .map_err(|e| invalid(format!("bucket `{}`: {}", env, e)))?;
            buckets.insert(env, location);
        }

        let mut seen = HashSet::new();
        let mut binaries = Vec::with_capacity(raw.binaries.len());
        for raw_bin in raw.binaries {
            let name = raw_bin.name.trim().to_string();
            if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
                return Err(invalid(format!("invalid binary name `{}`", raw_bin.name)));
            }
            if !seen.insert(name.clone()) {
                return Err(invalid(format!("binary `{}` is declared twice", name)));
            }

            let targets = match raw_bin.targets {
                None => None,
                Some(list) if list.is_empty() => {
                    return Err(invalid(format!(
                        "binary `{}` declares an empty `targets` list; omit it to build for the host",
                        name
                    )));
                }
                Some(list) => {
                    let mut pairs = Vec::with_capacity(list.len());
                    let mut unique = HashSet::new();
                    for raw_target in &list {
                        let target = raw_target
                            .parse::<TargetPair>()
                            .map_err(|e| invalid(format!("binary `{}`: {}", name, e)))?;
                        if !unique.insert(target.clone()) {
                            return Err(invalid(format!(
                                "binary `{}` lists target `{}` twice",
                                name, target
                            )));
                        }
                        pairs.push(target);
                    }
                    Some(pairs)
                }
            };

            let main = raw_bin
                .main
                .unwrap_or_else(|| format!("./cmd/{}", name));

            binaries.push(BinarySpec {
                name,
                kind: raw_bin.kind,
                targets,
                release: raw_bin.release,
                version_stamp: raw_bin.version_stamp,
                main,
            });
        }

        Ok(Manifest {
            path: path.to_path_buf(),
            config: BuildConfiguration { binaries },
            buckets: BucketMap { buckets },
            layout: raw.project,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The repository root: the directory holding the manifest.
    pub fn root(&self) -> &Path {
        self.path.parent().unwrap_or(Path::new("."))
    }

    pub fn config(&self) -> &BuildConfiguration {
        &self.config
    }

    pub fn buckets(&self) -> &BucketMap {
        &self.buckets
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }
}
