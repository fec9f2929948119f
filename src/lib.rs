//! Quay - release orchestration for multi-binary Go projects
//!
//! This crate provides the library behind the `quay` binary: the release
//! manifest, build metadata resolution, the build matrix executor and the
//! artifact publisher.

pub mod core;
pub mod ops;
pub mod storage;
pub mod util;

/// Test utilities and mocks for quay unit tests.
///
/// Only available when compiling tests. Provides a recording command
/// executor, manifest fixtures and git repository helpers.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{BinarySpec, BuildConfiguration, BuildMetadata, Manifest, TargetPair};
pub use crate::ops::{dispatch, Verb};
pub use crate::util::context::ReleaseContext;
