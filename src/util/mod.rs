//! Shared utilities

pub mod context;
pub mod errors;
pub mod fs;
pub mod hash;
pub mod process;
pub mod shell;

pub use context::ReleaseContext;
pub use errors::{ErrorKind, ReleaseError};
pub use process::{CommandRunner, ProcessBuilder, SystemRunner};
pub use shell::Shell;
