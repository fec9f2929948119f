//! Cloud uploads through the vendor CLIs.
//!
//! Credentials are whatever `gsutil` / `aws` pick up from the environment.

use std::path::Path;

use anyhow::Result;

use crate::util::errors::ReleaseError;
use crate::util::process::{CommandRunner, ProcessBuilder};

pub(super) fn upload_gcs(
    runner: &mut dyn CommandRunner,
    local: &Path,
    destination: &str,
    public: bool,
) -> Result<()> {
    let copy = ProcessBuilder::new("gsutil")
        .arg("cp")
        .arg(local)
        .arg(destination);
    run_upload(runner, &copy, local, destination)?;

    if public {
        let acl = ProcessBuilder::new("gsutil")
            .args(["acl", "ch", "-u", "AllUsers:R"])
            .arg(destination);
        run_upload(runner, &acl, local, destination)?;
    }
    Ok(())
}

pub(super) fn upload_s3(
    runner: &mut dyn CommandRunner,
    local: &Path,
    destination: &str,
    public: bool,
) -> Result<()> {
    let mut copy = ProcessBuilder::new("aws")
        .args(["s3", "cp"])
        .arg(local)
        .arg(destination);
    if public {
        copy = copy.args(["--acl", "public-read"]);
    }
    run_upload(runner, &copy, local, destination)
}

fn run_upload(
    runner: &mut dyn CommandRunner,
    cmd: &ProcessBuilder,
    local: &Path,
    destination: &str,
) -> Result<()> {
    tracing::debug!("running `{}`", cmd.display_command());
    let code = runner.run(cmd)?;
    if code != 0 {
        return Err(ReleaseError::PublishFailed {
            file: local.to_path_buf(),
            destination: destination.to_string(),
            code,
        }
        .into());
    }
    Ok(())
}
