//! External toolchain invocation.
//!
//! Working directory and environment are always passed explicitly per
//! invocation; the orchestrator never mutates its own process state.

use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};

use crate::errors::BuildError;

pub struct Exec {
    cmd: Command,
    name: String,
    quiet: bool,
}

impl Exec {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        let program = program.as_ref();
        let name = Path::new(program)
            .file_name()
            .unwrap_or(program)
            .to_string_lossy()
            .into_owned();
        Self {
            cmd: Command::new(program),
            name,
            quiet: false,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.cmd.arg(arg);
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.cmd.args(args);
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cmd.current_dir(dir);
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.cmd.env(key, value);
        self
    }

    /// Discard child stdout unless verbose output was requested.
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Run to completion; a nonzero exit is fatal.
    pub fn run(mut self) -> Result<()> {
        let status = self.spawn_wait()?;
        if !status.success() {
            return Err(BuildError::ToolInvocation {
                tool: self.name,
                status,
            }
            .into());
        }
        Ok(())
    }

    /// Run to completion, fatal only when the process cannot be spawned.
    /// The exit status is returned for callers that tolerate failure.
    pub fn run_unchecked(mut self) -> Result<ExitStatus> {
        self.spawn_wait()
    }

    /// Capture trimmed stdout; stderr is discarded. Nonzero exit is fatal.
    pub fn read(mut self) -> Result<String> {
        self.cmd.stdout(Stdio::piped()).stderr(Stdio::null());
        let out = self
            .cmd
            .output()
            .with_context(|| format!("Failed to run {}", self.name))?;
        if !out.status.success() {
            return Err(BuildError::ToolInvocation {
                tool: self.name,
                status: out.status,
            }
            .into());
        }
        Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
    }

    fn spawn_wait(&mut self) -> Result<ExitStatus> {
        if self.quiet {
            self.cmd.stdout(Stdio::null());
        }
        self.cmd
            .status()
            .with_context(|| format!("Failed to run {}", self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_captures_trimmed_stdout() {
        let out = Exec::new("echo").arg("hello").read().unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn test_run_nonzero_exit_is_error() {
        let err = Exec::new("false").run().unwrap_err();
        assert!(err.to_string().contains("false"));
    }

    #[test]
    fn test_run_unchecked_tolerates_nonzero_exit() {
        let status = Exec::new("false").run_unchecked().unwrap();
        assert!(!status.success());
    }
}
