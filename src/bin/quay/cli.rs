//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

use quay::util::context::DEFAULT_ENVIRONMENT;
use quay::util::shell::ColorChoice;

const VERBS_HELP: &str = "\
Verbs:
  version                 Print build metadata as sorted key=value lines
  fmt                     Ungroup imports, then goimports and gofmt the sources
  vet                     go vet every source root
  lint                    golint every source root
  gen                     go generate, then fmt
  build [name]            Build one binary (or all) for every target pair
  push [name]             Checksum and upload built artifacts
  install                 go install the configured packages
  test <type> [args...]   Run the e2e suite, forwarding args
  revendor                Refresh vendored dependencies

With no verb, runs gen then install.

Options go before the verb: `quay --env prod push hostfacts`. Everything
after the verb is passed to it, so `quay push hostfacts --env prod` is an
error.";

/// Quay - release orchestration for multi-binary Go projects
#[derive(Parser)]
#[command(name = "quay")]
#[command(author, version, about, long_about = None)]
#[command(after_help = VERBS_HELP)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print only warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Deployment environment selecting the publish bucket
    #[arg(long, global = true, value_name = "NAME", default_value = DEFAULT_ENVIRONMENT)]
    pub env: String,

    /// Path to Release.toml (searched upward from the current directory by default)
    #[arg(long, global = true, value_name = "PATH")]
    pub manifest_path: Option<PathBuf>,

    /// Verb to run
    pub verb: Option<String>,

    /// Verb arguments, passed through untouched
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}
