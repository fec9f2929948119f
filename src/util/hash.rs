//! Digests for artifacts and their checksum sidecars.
//!
//! Digests are lowercase hex, the format `sha256sum`, `sha1sum` and
//! `md5sum` print and verify.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use sha1::Sha1;
use sha2::{Digest, Sha256};

/// A checksum format published next to every artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    Sha256,
    Sha1,
    Md5,
}

impl ChecksumKind {
    /// Every published format, in sidecar-writing order.
    pub const ALL: [ChecksumKind; 3] = [ChecksumKind::Sha256, ChecksumKind::Sha1, ChecksumKind::Md5];

    /// Sidecar file extension, also the matching `*sum` tool's prefix.
    pub fn extension(self) -> &'static str {
        match self {
            ChecksumKind::Sha256 => "sha256",
            ChecksumKind::Sha1 => "sha1",
            ChecksumKind::Md5 => "md5",
        }
    }

    pub fn from_extension(ext: &str) -> Option<ChecksumKind> {
        ChecksumKind::ALL.into_iter().find(|kind| kind.extension() == ext)
    }
}

/// Hex digest of an in-memory buffer.
pub fn sha256_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Hex digest of a file, streamed so large binaries are never fully loaded.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)
        .with_context(|| format!("failed to hash file: {}", path.display()))?;
    Ok(hex::encode(hasher.finalize()))
}

/// Every [`ChecksumKind`] digest of a file, from a single read, in
/// [`ChecksumKind::ALL`] order.
pub fn file_digests(path: &Path) -> Result<Vec<(ChecksumKind, String)>> {
    let mut file = open(path)?;
    let mut sha256 = Sha256::new();
    let mut sha1 = Sha1::new();
    let mut md5 = md5::Context::new();

    let mut buffer = [0u8; 64 * 1024];
    loop {
        let n = file
            .read(&mut buffer)
            .with_context(|| format!("failed to hash file: {}", path.display()))?;
        if n == 0 {
            break;
        }
        sha256.update(&buffer[..n]);
        sha1.update(&buffer[..n]);
        md5.consume(&buffer[..n]);
    }

    Ok(vec![
        (ChecksumKind::Sha256, hex::encode(sha256.finalize())),
        (ChecksumKind::Sha1, hex::encode(sha1.finalize())),
        (ChecksumKind::Md5, format!("{:x}", md5.compute())),
    ])
}

fn open(path: &Path) -> Result<File> {
    File::open(path).with_context(|| format!("failed to open file for hashing: {}", path.display()))
}
