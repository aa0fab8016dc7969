use anyhow::{Context, Result as AnyResult};
use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use crate::{
    error::{Result, tool_error},
    exec::{self, CommandOutput},
};

/// The calls the run pipeline makes into the version-control tool.
///
/// Every method except [`Vcs::run_user_command`] treats a nonzero exit as a
/// tool fault and returns `Err`. Repository-level operations run from
/// [`Vcs::repo_dir`]; the others take the directory to run in.
pub trait Vcs {
    /// Root of the repository whose history is being rewritten.
    fn repo_dir(&self) -> &Path;
    /// Identifier of the most recent operation in the operation log.
    fn current_operation(&self) -> Result<String>;
    /// Register a new workspace rooted at `path`.
    fn add_workspace(&self, path: &Path) -> Result<()>;
    /// Names of all registered workspaces.
    fn list_workspaces(&self) -> Result<Vec<String>>;
    /// Remove the workspace registration called `name`.
    fn forget_workspace(&self, name: &str) -> Result<()>;
    /// Raw `json(self)` record stream for every change matching `revset`.
    fn log_json(&self, revset: &str, cwd: &Path) -> Result<String>;
    /// Start a new working-copy change on top of `change_id`.
    fn new_change(&self, change_id: &str, cwd: &Path) -> Result<()>;
    /// Run the user's shell command. Nonzero exits are returned, not raised.
    fn run_user_command(&self, command: &str, cwd: &Path) -> Result<CommandOutput>;
    /// Whether `change_id` is empty; `None` when the change no longer exists.
    fn is_empty(&self, change_id: &str, cwd: &Path) -> Result<Option<bool>>;
    /// Move the working copy of the workspace at `cwd` to edit `revision`.
    fn edit(&self, revision: &str, cwd: &Path) -> Result<()>;
    /// Copy the content of `change_id` into the working-copy change, keeping
    /// the content of its descendants as it is.
    fn restore_descendants_from(&self, change_id: &str, cwd: &Path) -> Result<()>;
    /// Abandon `change_id` if it still exists.
    fn abandon(&self, change_id: &str) -> Result<()>;
    /// Bring a stale working copy at `cwd` up to date.
    fn update_stale(&self, cwd: &Path) -> Result<()>;
}

/// [`Vcs`] implementation that shells out to the `jj` binary.
#[derive(Debug, Clone)]
pub struct Jj {
    /// Path or name of the jj executable.
    binary: OsString,
    /// Shell used to interpret the user command.
    shell: OsString,
    /// Repository root.
    repo_dir: PathBuf,
}

impl Jj {
    /// Create a gateway for the repository at `repo_dir`.
    pub fn new(binary: impl Into<OsString>, shell: impl Into<OsString>, repo_dir: PathBuf) -> Self {
        Self {
            binary: binary.into(),
            shell: shell.into(),
            repo_dir,
        }
    }

    /// Run jj with `args` in `cwd`, failing on a nonzero exit.
    fn run(&self, cwd: &Path, args: &[&str]) -> AnyResult<CommandOutput> {
        exec::run_checked(&self.binary, args, cwd)
    }

    /// Run jj in `cwd` and return its trimmed stdout.
    fn stdout(&self, cwd: &Path, args: &[&str]) -> Result<String> {
        self.run(cwd, args)
            .map(|output| output.stdout.trim().to_string())
            .map_err(|e| tool_error(&e))
    }

    /// Run jj in `cwd`, discarding its output.
    fn call(&self, cwd: &Path, args: &[&str]) -> Result<()> {
        self.run(cwd, args).map(|_| ()).map_err(|e| tool_error(&e))
    }
}

impl Vcs for Jj {
    fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    fn current_operation(&self) -> Result<String> {
        self.stdout(
            &self.repo_dir,
            &["op", "log", "-n1", "-T", "id", "--no-graph", "--no-pager"],
        )
    }

    fn add_workspace(&self, path: &Path) -> Result<()> {
        let path = path
            .to_str()
            .context("Invalid workspace path")
            .map_err(|e| tool_error(&e))?;
        self.call(&self.repo_dir, &["workspace", "add", path])
    }

    fn list_workspaces(&self) -> Result<Vec<String>> {
        let listing = self.stdout(&self.repo_dir, &["workspace", "list"])?;
        Ok(parse_workspace_list(&listing))
    }

    fn forget_workspace(&self, name: &str) -> Result<()> {
        self.call(&self.repo_dir, &["workspace", "forget", name])
    }

    fn log_json(&self, revset: &str, cwd: &Path) -> Result<String> {
        self.run(
            cwd,
            &["log", "-r", revset, "--template", "json(self)", "--no-graph"],
        )
        .map(|output| output.stdout)
        .map_err(|e| tool_error(&e))
    }

    fn new_change(&self, change_id: &str, cwd: &Path) -> Result<()> {
        self.call(cwd, &["new", change_id])
    }

    fn run_user_command(&self, command: &str, cwd: &Path) -> Result<CommandOutput> {
        exec::run_shell(&self.shell, command, cwd).map_err(|e| tool_error(&e))
    }

    fn is_empty(&self, change_id: &str, cwd: &Path) -> Result<Option<bool>> {
        let revset = present(change_id);
        let answer = self.stdout(
            cwd,
            &["log", "-T", "json(empty)", "-r", &revset, "--no-graph"],
        )?;
        Ok(parse_empty_flag(&answer))
    }

    fn edit(&self, revision: &str, cwd: &Path) -> Result<()> {
        self.call(cwd, &["edit", revision])
    }

    fn restore_descendants_from(&self, change_id: &str, cwd: &Path) -> Result<()> {
        self.call(
            cwd,
            &["restore", "--from", change_id, "--restore-descendants"],
        )
    }

    fn abandon(&self, change_id: &str) -> Result<()> {
        let revset = present(change_id);
        self.call(
            &self.repo_dir,
            &["abandon", &revset, "--ignore-working-copy"],
        )
    }

    fn update_stale(&self, cwd: &Path) -> Result<()> {
        self.call(cwd, &["workspace", "update-stale"])
    }
}

/// Wrap an identity in `present()` so absent revisions resolve to nothing.
pub fn present(id: &str) -> String {
    format!("present({id})")
}

/// Interpret the output of `jj log -T 'json(empty)'`.
fn parse_empty_flag(answer: &str) -> Option<bool> {
    match answer.trim() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Extract workspace names from the default `jj workspace list` output, which
/// prints one `name: <change> <commit> <description>` line per workspace.
fn parse_workspace_list(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(name, _)| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// Walk up from `start_dir` to find the nearest repository root containing a `.jj` directory.
pub fn find_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir;
    loop {
        if current.join(".jj").is_dir() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}
