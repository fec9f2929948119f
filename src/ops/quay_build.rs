//! Build matrix execution.
//!
//! Every binary in the manifest is compiled once per target pair, in
//! declaration order, with all targets sharing one [`BuildMetadata`]. The
//! first failing target aborts the run; artifacts from earlier targets stay
//! on disk.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::core::manifest::{BinaryKind, BinarySpec};
use crate::core::metadata::BuildMetadata;
use crate::core::target::TargetPair;
use crate::core::workspace::artifact_path;
use crate::ops::tasks;
use crate::util::context::ReleaseContext;
use crate::util::fs::ensure_dir;
use crate::util::hash::sha256_file;
use crate::util::process::{CommandRunner, ProcessBuilder};
use crate::util::shell::Status;

/// A built binary on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFile {
    pub binary: String,
    pub target: TargetPair,
    pub path: PathBuf,
    /// SHA-256 of the file as produced by the toolchain.
    pub sha256: String,
}

/// Generate and format once, then build `name` (or every binary).
pub fn build(
    ctx: &ReleaseContext,
    runner: &mut dyn CommandRunner,
    metadata: &BuildMetadata,
    name: Option<&str>,
) -> Result<Vec<ArtifactFile>> {
    // Reject unknown names before running anything.
    if let Some(name) = name {
        ctx.config().require(name)?;
    }

    tasks::gen(ctx, runner)?;

    let span = ctx
        .shell()
        .span(Status::Compiling, format!("version {}", metadata.version()));
    let artifacts = match name {
        Some(name) => build_one(ctx, runner, metadata, name)?,
        None => build_all(ctx, runner, metadata)?,
    };
    span.finish_with_message(format!("{} artifact(s)", artifacts.len()));
    Ok(artifacts)
}

/// Build every target of one binary.
pub fn build_one(
    ctx: &ReleaseContext,
    runner: &mut dyn CommandRunner,
    metadata: &BuildMetadata,
    name: &str,
) -> Result<Vec<ArtifactFile>> {
    let spec = ctx.config().require(name)?;
    build_binary(ctx, runner, metadata, spec)
}

/// Build every binary, in manifest order.
pub fn build_all(
    ctx: &ReleaseContext,
    runner: &mut dyn CommandRunner,
    metadata: &BuildMetadata,
) -> Result<Vec<ArtifactFile>> {
    let mut artifacts = Vec::new();
    for spec in ctx.config().iter() {
        artifacts.extend(build_binary(ctx, runner, metadata, spec)?);
    }
    Ok(artifacts)
}

fn build_binary(
    ctx: &ReleaseContext,
    runner: &mut dyn CommandRunner,
    metadata: &BuildMetadata,
    spec: &BinarySpec,
) -> Result<Vec<ArtifactFile>> {
    let mut artifacts = Vec::new();
    for target in spec.build_targets(ctx.host()) {
        ctx.shell()
            .status(Status::Compiling, format!("{} {}", spec.name(), target));

        let path = artifact_path(
            ctx.root(),
            spec.name(),
            &target.dir_name(),
            target.exe_suffix(),
        );
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }

        let cmd = match spec.kind() {
            BinaryKind::Go => go_build(ctx, metadata, spec, &target, &path),
        };
        ctx.shell().verbose(Status::Running, cmd.display_command());
        runner
            .run_checked(&cmd)
            .with_context(|| format!("failed to build `{}` for {}", spec.name(), target))?;

        let sha256 = sha256_file(&path)?;
        tracing::info!("built {} ({})", path.display(), &sha256[..12]);
        artifacts.push(ArtifactFile {
            binary: spec.name().to_string(),
            target,
            path,
            sha256,
        });
    }
    Ok(artifacts)
}

/// `go build` for one target, run from the repository root.
fn go_build(
    ctx: &ReleaseContext,
    metadata: &BuildMetadata,
    spec: &BinarySpec,
    target: &TargetPair,
    output: &std::path::Path,
) -> ProcessBuilder {
    let mut cmd = ProcessBuilder::new(ctx.toolchain())
        .cwd(ctx.root())
        .env("GOOS", target.go_os())
        .env("GOARCH", target.arch())
        .env("CGO_ENABLED", if target.uses_cgo() { "1" } else { "0" })
        .args(["build", "-o"])
        .arg(output);

    if target.uses_cgo() {
        cmd = cmd.args(["-a", "-installsuffix", "cgo"]);
    }
    if spec.version_stamp() {
        cmd = cmd.arg("-ldflags").arg(metadata.linker_flags(target));
    }
    cmd.arg(spec.main_package())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockExecutor, MockProcessOutput, ReleaseFixture};
    use crate::util::errors::{ErrorKind, ReleaseError};
    use crate::util::fs::{files_under, relative_path, to_slash};

    fn materializing() -> MockExecutor {
        let mut exec = MockExecutor::new();
        exec.set_default(MockProcessOutput::success(""));
        exec.materialize_outputs(true);
        exec
    }

    #[test]
    fn test_build_hostfacts_single_artifact() {
        let fx = ReleaseFixture::new();
        let ctx = fx.context();
        let md = fx.metadata();
        let mut exec = materializing();

        let artifacts = build_one(&ctx, &mut exec, &md, "hostfacts").unwrap();

        let expected = fx.root().join("dist/hostfacts/linux-amd64/hostfacts");
        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].path, expected);
        assert_eq!(artifacts[0].sha256, sha256_file(&expected).unwrap());

        let dir = fx.root().join("dist/hostfacts");
        let files: Vec<_> = files_under(&dir)
            .unwrap()
            .iter()
            .map(|p| to_slash(&relative_path(&dir, p)))
            .collect();
        assert_eq!(files, ["linux-amd64/hostfacts"]);
    }

    #[test]
    fn test_every_declared_pair_is_built_in_order() {
        let fx = ReleaseFixture::new();
        let ctx = fx.context();
        let md = fx.metadata();
        let mut exec = materializing();

        let artifacts = build_one(&ctx, &mut exec, &md, "hyperalert").unwrap();

        let dirs: Vec<_> = artifacts.iter().map(|a| a.target.dir_name()).collect();
        assert_eq!(dirs, ["alpine-amd64", "linux-amd64"]);
        for artifact in &artifacts {
            assert_eq!(
                artifact.path,
                fx.root()
                    .join("dist/hyperalert")
                    .join(artifact.target.dir_name())
                    .join("hyperalert")
            );
            assert!(artifact.path.is_file());
        }
    }

    #[test]
    fn test_go_build_command_shape() {
        let fx = ReleaseFixture::new();
        let ctx = fx.context();
        let md = fx.metadata();
        let mut exec = materializing();

        build_one(&ctx, &mut exec, &md, "hyperalert").unwrap();

        let alpine = &exec.commands()[0];
        assert_eq!(alpine.get_env("GOOS"), Some("linux"));
        assert_eq!(alpine.get_env("GOARCH"), Some("amd64"));
        assert_eq!(alpine.get_env("CGO_ENABLED"), Some("1"));
        assert!(alpine.get_args().iter().any(|a| a == "-installsuffix"));

        let linux = &exec.commands()[1];
        assert_eq!(linux.get_env("CGO_ENABLED"), Some("0"));
        assert_eq!(linux.get_args().last().unwrap(), "./cmd/hyperalert");
        let ldflags = linux
            .get_args()
            .iter()
            .skip_while(|a| *a != "-ldflags")
            .nth(1)
            .unwrap();
        assert!(ldflags.contains(&format!("-X main.version={}", md.version())));
        assert!(ldflags.contains("-X main.os=linux"));
    }

    #[test]
    fn test_host_pair_when_no_targets() {
        let fx = ReleaseFixture::with_manifest(
            r#"
[buckets]
dev = "gs://appscode-dev"

[[binary]]
name = "probe"
version-stamp = false
"#,
        );
        let ctx = fx.context().with_host(TargetPair::new("darwin", "arm64"));
        let md = fx.metadata();
        let mut exec = materializing();

        let artifacts = build_all(&ctx, &mut exec, &md).unwrap();

        assert_eq!(artifacts.len(), 1);
        assert!(artifacts[0].path.ends_with("dist/probe/darwin-arm64/probe"));
        assert!(!exec.commands()[0].get_args().iter().any(|a| a == "-ldflags"));
    }

    #[test]
    fn test_build_all_fails_fast_and_keeps_earlier_artifacts() {
        let fx = ReleaseFixture::new();
        let ctx = fx.context();
        let md = fx.metadata();
        let mut exec = materializing();
        exec.expect_contains("./cmd/hostfacts", MockProcessOutput::failure(2, "undefined: x"));

        let err = build_all(&ctx, &mut exec, &md).unwrap_err();

        let release = err
            .chain()
            .find_map(|e| e.downcast_ref::<ReleaseError>())
            .unwrap();
        assert_eq!(release.kind(), ErrorKind::ToolInvocation);
        assert_eq!(release.exit_code(), 2);
        // searchlight built, hostfacts failed, hyperalert never attempted
        assert!(fx.root().join("dist/searchlight/alpine-amd64/searchlight").is_file());
        assert_eq!(exec.calls().len(), 2);
        assert!(!fx.root().join("dist/hyperalert").exists());
    }

    #[test]
    fn test_build_generates_once_then_builds() {
        let fx = ReleaseFixture::new();
        let ctx = fx.context();
        let md = fx.metadata();
        let mut exec = materializing();

        let artifacts = build(&ctx, &mut exec, &md, None).unwrap();

        assert_eq!(artifacts.len(), 4);
        let generates = exec
            .calls()
            .iter()
            .filter(|c| c.starts_with("go generate"))
            .count();
        assert_eq!(generates, 1);
        assert!(exec.calls()[0].starts_with("go generate"));
        assert!(exec.calls()[3].starts_with("go build"));
    }

    #[test]
    fn test_unknown_binary_runs_nothing() {
        let fx = ReleaseFixture::new();
        let ctx = fx.context();
        let md = fx.metadata();
        let mut exec = materializing();

        let err = build(&ctx, &mut exec, &md, Some("kube-proxy")).unwrap_err();

        let release = err.downcast_ref::<ReleaseError>().unwrap();
        assert_eq!(release.kind(), ErrorKind::Config);
        assert!(exec.calls().is_empty());
    }

    #[test]
    fn test_windows_targets_get_exe_suffix() {
        let fx = ReleaseFixture::with_manifest(
            r#"
[buckets]
dev = "gs://appscode-dev"

[[binary]]
name = "probe"
targets = ["windows/amd64"]
"#,
        );
        let ctx = fx.context();
        let md = fx.metadata();
        let mut exec = materializing();

        let artifacts = build_all(&ctx, &mut exec, &md).unwrap();
        assert!(artifacts[0].path.ends_with("dist/probe/windows-amd64/probe.exe"));
    }
}
