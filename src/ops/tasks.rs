//! Pass-through steps: generate, format, vet, lint, install, test, revendor.
//!
//! Each step builds explicit command descriptors from the project layout and
//! runs them in the repository root. The first nonzero exit aborts the step
//! with [`ReleaseError::ToolFailed`](crate::util::errors::ReleaseError).

use anyhow::Result;

use crate::ops::imports::ungroup_go_imports;
use crate::util::context::ReleaseContext;
use crate::util::errors::ReleaseError;
use crate::util::process::{CommandRunner, ProcessBuilder};
use crate::util::shell::Status;

/// Printed by `quay test <type>` for any type other than `e2e`.
pub const TEST_NOTICE: &str = "only end-to-end tests are driven from here: quay test e2e [ginkgo args...]";

fn tool(ctx: &ReleaseContext, program: impl AsRef<std::path::Path>) -> ProcessBuilder {
    ProcessBuilder::new(program).cwd(ctx.root())
}

fn go(ctx: &ReleaseContext) -> ProcessBuilder {
    tool(ctx, ctx.toolchain())
}

fn run(ctx: &ReleaseContext, runner: &mut dyn CommandRunner, cmd: ProcessBuilder) -> Result<()> {
    ctx.shell().verbose(Status::Running, cmd.display_command());
    runner.run_checked(&cmd)
}

/// `./<root>/...` package patterns for every source root.
fn package_patterns(ctx: &ReleaseContext) -> Vec<String> {
    ctx.layout()
        .sources
        .iter()
        .map(|root| format!("./{}/...", root.trim_end_matches('/')))
        .collect()
}

/// Ungroup imports, then `goimports -w` and `gofmt -s -w` over the source
/// roots.
pub fn fmt(ctx: &ReleaseContext, runner: &mut dyn CommandRunner) -> Result<()> {
    let sources = &ctx.layout().sources;
    ctx.shell()
        .status(Status::Formatting, sources.join(" "));

    let roots: Vec<_> = sources.iter().map(|s| ctx.root().join(s)).collect();
    let changed = ungroup_go_imports(&roots)?;
    if changed > 0 {
        tracing::info!("ungrouped imports in {} file(s)", changed);
    }

    run(ctx, runner, tool(ctx, "goimports").arg("-w").args(sources))?;
    run(ctx, runner, tool(ctx, "gofmt").args(["-s", "-w"]).args(sources))
}

/// `go vet` over every source root in one invocation.
pub fn vet(ctx: &ReleaseContext, runner: &mut dyn CommandRunner) -> Result<()> {
    ctx.shell().status(Status::Checking, "go vet");
    run(ctx, runner, go(ctx).arg("vet").args(package_patterns(ctx)))
}

/// `golint` once per source root.
pub fn lint(ctx: &ReleaseContext, runner: &mut dyn CommandRunner) -> Result<()> {
    for pattern in package_patterns(ctx) {
        ctx.shell().status(Status::Checking, format!("golint {}", pattern));
        run(ctx, runner, tool(ctx, "golint").arg(pattern))?;
    }
    Ok(())
}

/// `go generate` for every generate entry, then [`fmt`].
pub fn gen(ctx: &ReleaseContext, runner: &mut dyn CommandRunner) -> Result<()> {
    for entry in &ctx.layout().generate {
        ctx.shell().status(Status::Generating, entry);
        run(ctx, runner, go(ctx).arg("generate").arg(entry))?;
    }
    fmt(ctx, runner)
}

/// `go install` of the configured packages.
pub fn install(ctx: &ReleaseContext, runner: &mut dyn CommandRunner) -> Result<()> {
    let packages = &ctx.layout().install;
    ctx.shell().status(Status::Installing, packages.join(" "));
    run(ctx, runner, go(ctx).arg("install").args(packages))
}

/// The no-verb sequence: generate, format, install.
pub fn release_prep(ctx: &ReleaseContext, runner: &mut dyn CommandRunner) -> Result<()> {
    gen(ctx, runner)?;
    install(ctx, runner)
}

/// Run the end-to-end suite for `kind == "e2e"`, forwarding `args` to the
/// suite untouched. Any other kind only prints [`TEST_NOTICE`].
pub fn test(
    ctx: &ReleaseContext,
    runner: &mut dyn CommandRunner,
    kind: &str,
    args: &[String],
) -> Result<()> {
    if kind != "e2e" {
        ctx.shell().status(Status::Skipped, TEST_NOTICE);
        return Ok(());
    }

    let suite = &ctx.layout().e2e;
    ctx.shell().status(Status::Testing, suite);
    let cmd = tool(ctx, "ginkgo")
        .args(["-r", "-v", "-progress", "-trace"])
        .arg(suite)
        .arg("--")
        .args(args);
    run(ctx, runner, cmd)
}

/// Run the configured vendoring command.
pub fn revendor(ctx: &ReleaseContext, runner: &mut dyn CommandRunner) -> Result<()> {
    let (program, args) =
        ctx.layout()
            .revendor
            .split_first()
            .ok_or_else(|| ReleaseError::InvalidManifest {
                path: ctx.manifest().path().to_path_buf(),
                message: "`project.revendor` is empty".to_string(),
            })?;
    ctx.shell()
        .status(Status::Vendoring, ctx.layout().revendor.join(" "));
    run(ctx, runner, tool(ctx, program).args(args))
}
