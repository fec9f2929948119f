//! Test utilities and mocks for quay unit tests.
//!
//! Every external tool quay drives goes through
//! [`CommandRunner`](crate::util::process::CommandRunner), so tests swap in a
//! [`MockExecutor`] that records each command and answers with a canned exit
//! status.
//!
//! # Example
//!
//! ```rust,ignore
//! use quay::test_support::{MockExecutor, MockProcessOutput, ReleaseFixture};
//!
//! #[test]
//! fn test_example() {
//!     let fx = ReleaseFixture::new();
//!     let mut exec = MockExecutor::new();
//!     exec.expect_prefix("go vet", MockProcessOutput::failure(1, "vet: errors"));
//!
//!     // Run an operation against fx.context() and inspect exec.calls()...
//! }
//! ```

pub mod fixtures;

use std::path::PathBuf;

use anyhow::{bail, Result};

use crate::util::fs::ensure_dir;
use crate::util::process::{CommandRunner, ProcessBuilder};

pub use fixtures::*;

/// Mock process output for testing command execution.
#[derive(Debug, Clone)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl MockProcessOutput {
    /// Create a successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Create a failure output with the given stderr and status code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Check if the process succeeded.
    pub fn success_status(&self) -> bool {
        self.status == 0
    }
}

impl Default for MockProcessOutput {
    fn default() -> Self {
        MockProcessOutput::success("")
    }
}

/// Pattern for matching commands in MockExecutor.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match if command contains substring.
    Contains(String),
    /// Match any command.
    Any,
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
            CommandPattern::Any => true,
        }
    }
}

/// Expectation for a command execution.
#[derive(Debug, Clone)]
pub struct CommandExpectation {
    pub pattern: CommandPattern,
    pub output: MockProcessOutput,
    /// Number of times this expectation can be used (None = unlimited).
    pub times: Option<usize>,
    pub used: usize,
}

impl CommandExpectation {
    pub fn new(pattern: CommandPattern, output: MockProcessOutput) -> Self {
        CommandExpectation {
            pattern,
            output,
            times: None,
            used: 0,
        }
    }

    /// Set the number of times this expectation can be used.
    pub fn times(mut self, n: usize) -> Self {
        self.times = Some(n);
        self
    }

    fn available(&self) -> bool {
        self.times.map_or(true, |n| self.used < n)
    }
}

/// Recording [`CommandRunner`].
///
/// Commands are matched as `"<program> <args...>"` (environment excluded)
/// against expectations in insertion order, then against the default. With
/// [`materialize_outputs`](Self::materialize_outputs) enabled, a successful
/// command writes a small file at the path following `-o`, standing in for
/// the compiler's output.
#[derive(Debug, Default)]
pub struct MockExecutor {
    expectations: Vec<CommandExpectation>,
    calls: Vec<String>,
    commands: Vec<ProcessBuilder>,
    default_output: Option<MockProcessOutput>,
    materialize: bool,
}

impl MockExecutor {
    pub fn new() -> Self {
        MockExecutor::default()
    }

    /// Add an expectation for an exact command match.
    pub fn expect(&mut self, cmd: &str, output: MockProcessOutput) -> &mut Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::Exact(cmd.to_string()),
            output,
        ))
    }

    /// Add an expectation for a command starting with a prefix.
    pub fn expect_prefix(&mut self, prefix: &str, output: MockProcessOutput) -> &mut Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::StartsWith(prefix.to_string()),
            output,
        ))
    }

    /// Add an expectation for a command containing a substring.
    pub fn expect_contains(&mut self, substring: &str, output: MockProcessOutput) -> &mut Self {
        self.expect_pattern(CommandExpectation::new(
            CommandPattern::Contains(substring.to_string()),
            output,
        ))
    }

    pub fn expect_pattern(&mut self, expectation: CommandExpectation) -> &mut Self {
        self.expectations.push(expectation);
        self
    }

    /// Set a default output for commands that don't match any expectation.
    pub fn set_default(&mut self, output: MockProcessOutput) -> &mut Self {
        self.default_output = Some(output);
        self
    }

    /// Create `-o <path>` outputs for successful commands.
    pub fn materialize_outputs(&mut self, enabled: bool) -> &mut Self {
        self.materialize = enabled;
        self
    }

    /// Every command line seen, in order.
    pub fn calls(&self) -> &[String] {
        &self.calls
    }

    /// Every command descriptor seen, in order.
    pub fn commands(&self) -> &[ProcessBuilder] {
        &self.commands
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
        self.commands.clear();
    }

    /// Verify that all expectations with a specific count were satisfied.
    pub fn verify(&self) -> Result<()> {
        for (i, exp) in self.expectations.iter().enumerate() {
            if let Some(expected) = exp.times {
                if exp.used != expected {
                    bail!(
                        "expectation {} was used {} times, expected {}",
                        i,
                        exp.used,
                        expected
                    );
                }
            }
        }
        Ok(())
    }

    fn lookup(&mut self, line: &str) -> Option<MockProcessOutput> {
        for exp in &mut self.expectations {
            if exp.pattern.matches(line) && exp.available() {
                exp.used += 1;
                return Some(exp.output.clone());
            }
        }
        self.default_output.clone()
    }

    fn output_path(cmd: &ProcessBuilder) -> Option<PathBuf> {
        let args = cmd.get_args();
        let pos = args.iter().position(|a| a == "-o")?;
        let path = PathBuf::from(args.get(pos + 1)?);
        Some(match cmd.get_cwd() {
            Some(cwd) if path.is_relative() => cwd.join(path),
            _ => path,
        })
    }
}

fn command_line(cmd: &ProcessBuilder) -> String {
    let mut line = cmd.get_program().display().to_string();
    for arg in cmd.get_args() {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

impl CommandRunner for MockExecutor {
    fn run(&mut self, cmd: &ProcessBuilder) -> Result<i32> {
        let line = command_line(cmd);
        self.calls.push(line.clone());
        self.commands.push(cmd.clone());

        let Some(output) = self.lookup(&line) else {
            bail!("unexpected command: {}", line);
        };

        if self.materialize && output.success_status() {
            if let Some(path) = Self::output_path(cmd) {
                if let Some(parent) = path.parent() {
                    ensure_dir(parent)?;
                }
                std::fs::write(&path, format!("built by: {}\n", line))?;
            }
        }
        Ok(output.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_patterns_match_in_order() {
        let mut exec = MockExecutor::new();
        exec.expect("go version", MockProcessOutput::success("go1.22"))
            .expect_prefix("go", MockProcessOutput::failure(2, "bad"));

        let ok = ProcessBuilder::new("go").arg("version");
        let bad = ProcessBuilder::new("go").arg("vet");
        assert_eq!(exec.run(&ok).unwrap(), 0);
        assert_eq!(exec.run(&bad).unwrap(), 2);
        assert_eq!(exec.calls(), ["go version", "go vet"]);
    }

    #[test]
    fn test_unexpected_command_errors() {
        let mut exec = MockExecutor::new();
        let err = exec.run(&ProcessBuilder::new("gsutil")).unwrap_err();
        assert!(err.to_string().contains("unexpected command: gsutil"));
    }

    #[test]
    fn test_times_limits_expectation() {
        let mut exec = MockExecutor::new();
        exec.expect_pattern(
            CommandExpectation::new(CommandPattern::Any, MockProcessOutput::failure(1, "")).times(1),
        );
        exec.set_default(MockProcessOutput::success(""));

        let cmd = ProcessBuilder::new("golint");
        assert_eq!(exec.run(&cmd).unwrap(), 1);
        assert_eq!(exec.run(&cmd).unwrap(), 0);
        exec.verify().unwrap();
    }

    #[test]
    fn test_materialize_relative_to_cwd() {
        let tmp = TempDir::new().unwrap();
        let mut exec = MockExecutor::new();
        exec.set_default(MockProcessOutput::success(""))
            .materialize_outputs(true);

        let cmd = ProcessBuilder::new("go")
            .cwd(tmp.path())
            .args(["build", "-o", "dist/x/linux-amd64/x", "./cmd/x"]);
        exec.run(&cmd).unwrap();

        assert!(tmp.path().join("dist/x/linux-amd64/x").is_file());
    }
}
