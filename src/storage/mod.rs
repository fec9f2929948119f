//! Publish destinations.
//!
//! A bucket is named by a URI whose scheme selects the upload strategy:
//! - `gs://bucket[/prefix]` - Google Cloud Storage via `gsutil`
//! - `s3://bucket[/prefix]` - Amazon S3 via the `aws` CLI
//! - `file:///abs/path` - a local directory, for staging and dry runs
//!
//! Objects are keyed `binaries/<name>/<version>/<relative path>`, so
//! publishing the same version again overwrites the same keys.

mod cloud;
mod local;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Result;
use url::Url;

use crate::util::process::CommandRunner;

/// Upload strategy for a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Gcs,
    S3,
    Local,
}

/// A parsed bucket URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketLocation {
    url: Url,
    kind: StorageKind,
}

impl BucketLocation {
    pub fn kind(&self) -> StorageKind {
        self.kind
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Object key for one file of a published binary.
    pub fn object_key(binary: &str, version: &str, relative: &str) -> String {
        format!("binaries/{}/{}/{}", binary, version, relative)
    }

    /// Full destination URI for an object key.
    pub fn destination(&self, key: &str) -> String {
        format!("{}/{}", self.url.as_str().trim_end_matches('/'), key)
    }

    /// Upload `local` to `key`, overwriting any existing object.
    ///
    /// `public` grants anonymous read access to the uploaded object.
    pub fn upload(
        &self,
        runner: &mut dyn CommandRunner,
        local: &Path,
        key: &str,
        public: bool,
    ) -> Result<()> {
        match self.kind {
            StorageKind::Gcs => cloud::upload_gcs(runner, local, &self.destination(key), public),
            StorageKind::S3 => cloud::upload_s3(runner, local, &self.destination(key), public),
            StorageKind::Local => local::upload(&self.url, local, key),
        }
    }
}

impl fmt::Display for BucketLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str().trim_end_matches('/'))
    }
}

impl FromStr for BucketLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let url = Url::parse(s).map_err(|e| format!("invalid bucket URI `{}`: {}", s, e))?;
        let kind = match url.scheme() {
            "gs" => StorageKind::Gcs,
            "s3" => StorageKind::S3,
            "file" => StorageKind::Local,
            other => {
                return Err(format!(
                    "unsupported bucket scheme `{}` in `{}`; expected gs://, s3:// or file://",
                    other, s
                ))
            }
        };

        if kind != StorageKind::Local && url.host_str().map_or(true, str::is_empty) {
            return Err(format!("bucket URI `{}` names no bucket", s));
        }

        Ok(BucketLocation { url, kind })
    }
}
