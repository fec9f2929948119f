//! Core data structures for quay.
//!
//! - Target pairs (`os/arch`)
//! - The release manifest: build matrix, bucket map, project layout
//! - Per-invocation build metadata
//! - Manifest discovery and output paths

pub mod manifest;
pub mod metadata;
pub mod target;
pub mod workspace;

pub use manifest::{BinaryKind, BinarySpec, BucketMap, BuildConfiguration, Manifest, ProjectLayout};
pub use metadata::{BuildMetadata, VersionStrategy};
pub use target::TargetPair;
pub use workspace::{artifact_path, find_manifest, DIST_DIR, MANIFEST_NAME};
