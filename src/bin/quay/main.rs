//! Quay CLI - release orchestration for multi-binary Go projects

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;
use quay::core::workspace::find_manifest;
use quay::ops::{dispatch, Verb};
use quay::util::errors::{exit_code_for, ReleaseError};
use quay::util::process::SystemRunner;
use quay::util::shell::Shell;
use quay::util::ReleaseContext;

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(exit_code_for(&e));
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("quay=debug")
        } else if cli.quiet {
            EnvFilter::new("quay=warn")
        } else {
            EnvFilter::new("quay=info")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    // Verb errors take precedence over a missing manifest.
    if let Some(verb) = cli.verb.as_deref() {
        verb.parse::<Verb>()?;
    }

    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let manifest_path = match cli.manifest_path {
        Some(path) => cwd.join(path),
        None => find_manifest(&cwd).map_err(ReleaseError::from)?,
    };
    tracing::debug!("using manifest {}", manifest_path.display());

    let shell = Shell::from_flags(cli.quiet, cli.verbose, cli.color);
    let ctx = ReleaseContext::load(&manifest_path, cli.env)?.with_shell(shell);
    dispatch(&ctx, &mut SystemRunner, cli.verb.as_deref(), &cli.args)
}
