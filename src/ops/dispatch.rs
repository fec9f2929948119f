//! Verb dispatch: the single entry point for every quay flow.
//!
//! Verbs form a closed set. Names map to [`Verb`] through one table, and
//! [`run`] matches every variant, so adding a verb without a handler does not
//! compile. Verb and argument errors are reported before any external tool
//! runs.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;

use crate::core::metadata::BuildMetadata;
use crate::ops::{quay_build, quay_push, tasks};
use crate::util::context::ReleaseContext;
use crate::util::errors::ReleaseError;
use crate::util::process::CommandRunner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Version,
    Fmt,
    Vet,
    Lint,
    Gen,
    Build,
    Push,
    Install,
    Test,
    Revendor,
}

const VERBS: &[(&str, Verb)] = &[
    ("version", Verb::Version),
    ("fmt", Verb::Fmt),
    ("vet", Verb::Vet),
    ("lint", Verb::Lint),
    ("gen", Verb::Gen),
    ("build", Verb::Build),
    ("push", Verb::Push),
    ("install", Verb::Install),
    ("test", Verb::Test),
    ("revendor", Verb::Revendor),
];

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Version => "version",
            Verb::Fmt => "fmt",
            Verb::Vet => "vet",
            Verb::Lint => "lint",
            Verb::Gen => "gen",
            Verb::Build => "build",
            Verb::Push => "push",
            Verb::Install => "install",
            Verb::Test => "test",
            Verb::Revendor => "revendor",
        }
    }

    /// Every verb, in help order.
    pub fn all() -> impl Iterator<Item = Verb> {
        VERBS.iter().map(|(_, verb)| *verb)
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VERBS
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, verb)| *verb)
            .ok_or_else(|| ReleaseError::UnknownVerb {
                verb: s.to_string(),
                expected: VERBS
                    .iter()
                    .map(|(name, _)| *name)
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Parse `verb` and run it. No verb runs the release-prep sequence.
pub fn dispatch(
    ctx: &ReleaseContext,
    runner: &mut dyn CommandRunner,
    verb: Option<&str>,
    args: &[String],
) -> Result<()> {
    match verb {
        None => {
            if let Some(extra) = args.first() {
                return Err(ReleaseError::UnknownVerb {
                    verb: extra.clone(),
                    expected: Verb::all().map(Verb::as_str).collect::<Vec<_>>().join(", "),
                }
                .into());
            }
            tasks::release_prep(ctx, runner)
        }
        Some(verb) => run(ctx, runner, verb.parse()?, args),
    }
}

/// Run a parsed verb.
pub fn run(
    ctx: &ReleaseContext,
    runner: &mut dyn CommandRunner,
    verb: Verb,
    args: &[String],
) -> Result<()> {
    match verb {
        Verb::Version => {
            no_args(verb, args)?;
            let metadata = resolve_metadata(ctx)?;
            print!("{}", metadata.render());
            Ok(())
        }
        Verb::Fmt => {
            no_args(verb, args)?;
            tasks::fmt(ctx, runner)
        }
        Verb::Vet => {
            no_args(verb, args)?;
            tasks::vet(ctx, runner)
        }
        Verb::Lint => {
            no_args(verb, args)?;
            tasks::lint(ctx, runner)
        }
        Verb::Gen => {
            no_args(verb, args)?;
            tasks::gen(ctx, runner)
        }
        Verb::Build => {
            let name = optional_name(verb, args)?;
            if let Some(name) = name {
                ctx.config().require(name)?;
            }
            let metadata = resolve_metadata(ctx)?;
            quay_build::build(ctx, runner, &metadata, name)?;
            Ok(())
        }
        Verb::Push => {
            let name = optional_name(verb, args)?;
            if let Some(name) = name {
                ctx.config().require(name)?;
            }
            ctx.bucket()?;
            let metadata = resolve_metadata(ctx)?;
            match name {
                Some(name) => {
                    quay_push::push_one(ctx, runner, &metadata, name)?;
                }
                None => {
                    quay_push::push_all(ctx, runner, &metadata)?;
                }
            }
            Ok(())
        }
        Verb::Install => {
            no_args(verb, args)?;
            tasks::install(ctx, runner)
        }
        Verb::Test => {
            let (kind, rest) = args.split_first().ok_or(ReleaseError::MissingArgument {
                verb: "test",
                what: "a test type (e.g. `e2e`)",
            })?;
            tasks::test(ctx, runner, kind, rest)
        }
        Verb::Revendor => {
            no_args(verb, args)?;
            tasks::revendor(ctx, runner)
        }
    }
}

fn resolve_metadata(ctx: &ReleaseContext) -> Result<BuildMetadata> {
    Ok(BuildMetadata::resolve(ctx.root(), ctx.host())?)
}

/// Global options are only recognized before the verb; anything after it is
/// a verb argument.
fn reject_flags(verb: Verb, args: &[String]) -> Result<(), ReleaseError> {
    match args.iter().find(|arg| arg.starts_with('-')) {
        Some(flag) => Err(ReleaseError::FlagAfterVerb {
            verb: verb.as_str(),
            flag: flag.clone(),
        }),
        None => Ok(()),
    }
}

fn no_args(verb: Verb, args: &[String]) -> Result<(), ReleaseError> {
    reject_flags(verb, args)?;
    match args.first() {
        Some(arg) => Err(ReleaseError::UnexpectedArgument {
            verb: verb.as_str(),
            arg: arg.clone(),
        }),
        None => Ok(()),
    }
}

fn optional_name(verb: Verb, args: &[String]) -> Result<Option<&str>, ReleaseError> {
    reject_flags(verb, args)?;
    match args {
        [] => Ok(None),
        [name] => Ok(Some(name.as_str())),
        [_, extra, ..] => Err(ReleaseError::UnexpectedArgument {
            verb: verb.as_str(),
            arg: extra.clone(),
        }),
    }
}
