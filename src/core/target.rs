//! Target pairs: the (operating system, architecture) a binary is built for.
//!
//! Names follow the Go toolchain (`linux`, `darwin`, `amd64`, `arm64`, ...),
//! plus the pseudo-OS `alpine`: a cgo-enabled, statically linked `linux`
//! build that keeps its own artifact directory.

use std::fmt;
use std::str::FromStr;

/// Pseudo-OS for musl-friendly static linux builds.
pub const OS_ALPINE: &str = "alpine";
pub const OS_LINUX: &str = "linux";
pub const OS_WINDOWS: &str = "windows";

/// An (os, arch) pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetPair {
    os: String,
    arch: String,
}

impl TargetPair {
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        TargetPair {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// The host pair, honoring `GOHOSTOS` / `GOHOSTARCH` when set.
    pub fn host() -> Self {
        Self::host_from(|key| std::env::var(key).ok())
    }

    /// The host pair using `lookup` for environment access.
    pub fn host_from(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let os = lookup("GOHOSTOS")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| go_os_name(std::env::consts::OS).to_string());
        let arch = lookup("GOHOSTARCH")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| go_arch_name(std::env::consts::ARCH).to_string());
        TargetPair { os, arch }
    }

    /// The declared OS (may be the `alpine` pseudo-OS).
    pub fn os(&self) -> &str {
        &self.os
    }

    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// The `GOOS` value handed to the toolchain.
    pub fn go_os(&self) -> &str {
        if self.os == OS_ALPINE {
            OS_LINUX
        } else {
            &self.os
        }
    }

    /// Whether the build links against libc (cgo enabled, static flags).
    pub fn uses_cgo(&self) -> bool {
        self.os == OS_ALPINE
    }

    /// Artifact directory name: `<os>-<arch>`.
    pub fn dir_name(&self) -> String {
        format!("{}-{}", self.os, self.arch)
    }

    /// Executable file suffix for this target.
    pub fn exe_suffix(&self) -> &'static str {
        if self.os == OS_WINDOWS {
            ".exe"
        } else {
            ""
        }
    }
}

impl fmt::Display for TargetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

impl FromStr for TargetPair {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let valid = |part: &str| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        };

        match s.split_once('/') {
            Some((os, arch)) if valid(os) && valid(arch) => Ok(TargetPair::new(os, arch)),
            _ => Err(format!(
                "invalid target `{}`; expected `<os>/<arch>` such as `linux/amd64`",
                s
            )),
        }
    }
}

/// Map a Rust `std::env::consts::OS` value to its Go name.
fn go_os_name(os: &str) -> &str {
    match os {
        "macos" => "darwin",
        other => other,
    }
}

/// Map a Rust `std::env::consts::ARCH` value to its Go name.
fn go_arch_name(arch: &str) -> &str {
    match arch {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        other => other,
    }
}
