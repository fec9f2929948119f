//! Release error taxonomy.
//!
//! Every failure that changes the process exit code is a [`ReleaseError`].
//! Operations propagate them through `anyhow`; the binary downcasts to pick
//! the exit status.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::workspace::ManifestError;

/// Exit status used for configuration errors (bad verb, unknown binary, ...).
pub const CONFIG_EXIT_CODE: i32 = 2;

/// Exit status used when an external tool cannot be spawned at all.
pub const MISSING_TOOL_EXIT_CODE: i32 = 127;

/// Broad classification of a [`ReleaseError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any external tool ran.
    Config,
    /// A compiler, formatter, linter, generator or test runner exited nonzero.
    ToolInvocation,
    /// An upload failed.
    Publish,
    /// Version-control state could not be read.
    Metadata,
}

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("unknown verb `{verb}` (expected one of: {expected})")]
    UnknownVerb { verb: String, expected: String },

    #[error("unknown binary `{name}` (configured: {configured})")]
    UnknownBinary { name: String, configured: String },

    #[error("unknown environment `{name}` (buckets are defined for: {known})")]
    UnknownEnvironment { name: String, known: String },

    #[error("`{verb}` requires {what}")]
    MissingArgument { verb: &'static str, what: &'static str },

    #[error("`{verb}` does not accept argument `{arg}`")]
    UnexpectedArgument { verb: &'static str, arg: String },

    #[error("`{verb}` does not accept `{flag}`; global options go before the verb")]
    FlagAfterVerb { verb: &'static str, flag: String },

    #[error(transparent)]
    ManifestMissing(#[from] ManifestError),

    #[error("invalid manifest {}: {message}", path.display())]
    InvalidManifest { path: PathBuf, message: String },

    #[error("`{command}` failed with exit code {code}")]
    ToolFailed { command: String, code: i32 },

    #[error("could not run `{program}`: not found")]
    ToolMissing { program: String },

    #[error("upload of {} to `{destination}` failed with exit code {code}", file.display())]
    PublishFailed {
        file: PathBuf,
        destination: String,
        code: i32,
    },

    #[error("copy of {} to `{destination}` failed: {source}", file.display())]
    PublishIo {
        file: PathBuf,
        destination: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot resolve build metadata from {}: {message}", repo.display())]
    Metadata { repo: PathBuf, message: String },
}

impl ReleaseError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReleaseError::UnknownVerb { .. }
            | ReleaseError::UnknownBinary { .. }
            | ReleaseError::UnknownEnvironment { .. }
            | ReleaseError::MissingArgument { .. }
            | ReleaseError::UnexpectedArgument { .. }
            | ReleaseError::FlagAfterVerb { .. }
            | ReleaseError::ManifestMissing(_)
            | ReleaseError::InvalidManifest { .. } => ErrorKind::Config,
            ReleaseError::ToolFailed { .. } | ReleaseError::ToolMissing { .. } => {
                ErrorKind::ToolInvocation
            }
            ReleaseError::PublishFailed { .. } | ReleaseError::PublishIo { .. } => {
                ErrorKind::Publish
            }
            ReleaseError::Metadata { .. } => ErrorKind::Metadata,
        }
    }

    /// The process exit status this error maps to.
    ///
    /// Tool and upload failures mirror the child's own status.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReleaseError::ToolFailed { code, .. } | ReleaseError::PublishFailed { code, .. } => {
                *code
            }
            ReleaseError::ToolMissing { .. } => MISSING_TOOL_EXIT_CODE,
            ReleaseError::PublishIo { .. } | ReleaseError::Metadata { .. } => 1,
            _ => CONFIG_EXIT_CODE,
        }
    }
}

/// Find the [`ReleaseError`] at the root of an `anyhow` chain, if any.
pub fn release_error(err: &anyhow::Error) -> Option<&ReleaseError> {
    err.chain().find_map(|cause| cause.downcast_ref::<ReleaseError>())
}

/// Exit status for an arbitrary error: the release error's code, or 1.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    release_error(err).map(ReleaseError::exit_code).unwrap_or(1)
}
