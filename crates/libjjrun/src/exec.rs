use anyhow::{Context, Result};
use std::{
    ffi::OsStr,
    path::Path,
    process::{Command, Output},
};
use tracing::debug;

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Everything the process wrote to stdout, lossily decoded.
    pub stdout: String,
    /// Everything the process wrote to stderr, lossily decoded.
    pub stderr: String,
    /// Exit code; processes killed by a signal report `1`.
    pub code: i32,
}

impl CommandOutput {
    /// Whether the process exited with status zero.
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

impl From<Output> for CommandOutput {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code().unwrap_or(1),
        }
    }
}

/// Run `program` with an argument vector (never through a shell) in `cwd`.
/// Returns the output if successful, otherwise returns an error with the full command details.
pub fn run_checked(program: &OsStr, args: &[&str], cwd: &Path) -> Result<CommandOutput> {
    let cmdline = format!("{} {}", program.to_string_lossy(), args.join(" "));
    debug!(command = %cmdline, cwd = %cwd.display(), "running tool command");

    let output: CommandOutput = Command::new(program)
        .current_dir(cwd)
        .args(args)
        .output()
        .with_context(|| format!("Failed to execute command: {cmdline}"))?
        .into();

    if !output.success() {
        anyhow::bail!(
            "Command failed: {}\nError: {}",
            cmdline,
            output.stderr.trim()
        );
    }

    Ok(output)
}

/// Run a shell command string as `<shell> -c <command>` in `cwd`.
///
/// A nonzero exit is not an error: the exit code is returned for the caller to
/// classify. Only a failure to start the shell is reported as `Err`.
pub fn run_shell(shell: &OsStr, command: &str, cwd: &Path) -> Result<CommandOutput> {
    debug!(shell = %shell.to_string_lossy(), cwd = %cwd.display(), command, "running user command");

    let output = Command::new(shell)
        .arg("-c")
        .arg(command)
        .current_dir(cwd)
        .output()
        .with_context(|| {
            format!(
                "Failed to start shell {} for command: {command}",
                shell.to_string_lossy()
            )
        })?;

    Ok(output.into())
}
