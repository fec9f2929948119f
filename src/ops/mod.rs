//! High-level operations.
//!
//! This module contains the implementation of quay verbs.

pub mod dispatch;
pub mod imports;
pub mod quay_build;
pub mod quay_push;
pub mod tasks;

pub use dispatch::{dispatch, Verb};
pub use quay_build::{build, build_all, build_one, ArtifactFile};
pub use quay_push::{push_all, push_one, PushReport};
