//! Subprocess port for engines that delegate to ecosystem tooling.
//!
//! Engines never spawn processes directly. They go through a
//! [`CommandRunner`], which lets tests substitute a fake that records
//! invocations and simulates tool side effects.

use std::fmt;
use std::path::PathBuf;
use std::process::Command;

use camino::Utf8Path;
use thiserror::Error;
use tracing::{debug, instrument};

/// Errors from running an external command.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The process could not be started.
    #[error("failed to execute `{command}`: {source}")]
    Spawn {
        /// The rendered command line.
        command: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The process exited with a non-zero status.
    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        /// The rendered command line.
        command: String,
        /// Exit status description.
        status: String,
        /// Captured stderr, trimmed.
        stderr: String,
    },
}

/// Result alias for command execution.
pub type CommandResult<T> = Result<T, CommandError>;

/// Captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Captured stdout (lossy UTF-8).
    pub stdout: String,
    /// Captured stderr (lossy UTF-8).
    pub stderr: String,
}

/// Runs external programs and resolves binaries on `PATH`.
pub trait CommandRunner: fmt::Debug + Send + Sync {
    /// Resolve `binary` on the execution path.
    fn resolve(&self, binary: &str) -> Option<PathBuf>;

    /// Run `program` with `args` in `cwd`, requiring a zero exit status.
    fn run(&self, program: &str, args: &[String], cwd: &Utf8Path) -> CommandResult<CommandOutput>;
}

/// Render a command line for logs and error messages.
pub fn display_command(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(" ")
}

/// [`CommandRunner`] backed by real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn resolve(&self, binary: &str) -> Option<PathBuf> {
        which::which(binary).ok()
    }

    #[instrument(skip(self, args), fields(%cwd))]
    fn run(&self, program: &str, args: &[String], cwd: &Utf8Path) -> CommandResult<CommandOutput> {
        let command = display_command(program, args);
        debug!(%command, "running external command");

        let output = Command::new(program)
            .args(args)
            .current_dir(cwd.as_std_path())
            .output()
            .map_err(|source| CommandError::Spawn {
                command: command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(CommandError::Failed {
                command,
                status: output.status.to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(CommandOutput { stdout, stderr })
    }
}
