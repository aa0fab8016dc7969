use std::path::{Path, PathBuf};

use tempfile::Builder;
use tracing::{info, warn};

use crate::{
    change::{self, Change},
    cleanup,
    error::{JjRunError, Result},
    jj::Vcs,
};

/// Prefix of every scratch directory, and therefore of every workspace name.
pub const SCRATCH_PREFIX: &str = "jj-run-";

/// A scratch workspace registered for the duration of a run.
///
/// Owns cleanup of the workspace registration and of every change recorded
/// through [`WorkspaceGuard::track`]. Call [`WorkspaceGuard::close`] (or use
/// [`WorkspaceGuard::scope`]) to release it and observe the result; if the
/// guard is dropped without that, cleanup runs best-effort on drop.
pub struct WorkspaceGuard<'a> {
    /// Gateway used for every call into jj.
    vcs: &'a dyn Vcs,
    /// Root of the scratch workspace's working copy.
    path: PathBuf,
    /// Workspace name; the basename of `path`.
    name: String,
    /// Working-copy change jj created when the workspace was added.
    bootstrap: Option<Change>,
    /// Changes to abandon on release, bootstrap first.
    scratch: Vec<String>,
    /// Whether cleanup has already run.
    closed: bool,
}

impl<'a> WorkspaceGuard<'a> {
    /// Create and register a scratch workspace under `scratch_root`.
    ///
    /// The directory is created with a unique `jj-run-` name and kept on
    /// disk; jj populates a child directory of the same name. Fails with a
    /// tool fault unless the new workspace has exactly one working-copy
    /// change.
    pub fn open(vcs: &'a dyn Vcs, scratch_root: &Path) -> Result<Self> {
        let dir = Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(scratch_root)?
            .keep();
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                JjRunError::Context(format!("Invalid scratch directory: {}", dir.display()))
            })?;
        let path = dir.join(&name);

        vcs.add_workspace(&path)?;
        info!(workspace = %name, path = %path.display(), "added scratch workspace");

        let mut guard = Self {
            vcs,
            path,
            name,
            bootstrap: None,
            scratch: Vec::new(),
            closed: false,
        };

        let revset = format!("{}@", guard.name);
        let mut found = change::resolve(vcs, &revset, vcs.repo_dir())?;
        if found.len() != 1 {
            return Err(JjRunError::Tool(format!(
                "expected one working-copy change in workspace {}, found {}",
                guard.name,
                found.len()
            )));
        }
        let bootstrap = found.remove(0);
        guard.scratch.push(bootstrap.change_id.clone());
        guard.bootstrap = Some(bootstrap);
        Ok(guard)
    }

    /// Gateway the workspace was opened with.
    pub fn vcs(&self) -> &'a dyn Vcs {
        self.vcs
    }

    /// Root of the scratch working copy.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Registered workspace name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Restrict `selection` so it never names the bootstrap change or the root.
    pub fn narrow(&self, selection: &str) -> String {
        match &self.bootstrap {
            Some(bootstrap) => format!("({selection}) ~ {} ~ root()", bootstrap.change_id),
            None => format!("({selection}) ~ root()"),
        }
    }

    /// Record changes that must be abandoned when the workspace is released.
    pub fn track(&mut self, changes: &[Change]) {
        self.scratch
            .extend(changes.iter().map(|change| change.change_id.clone()));
    }

    /// Identities of every change tracked for abandonment.
    pub fn tracked(&self) -> &[String] {
        &self.scratch
    }

    /// Release the workspace, returning the first cleanup failure.
    pub fn close(mut self) -> Result<()> {
        self.release()
    }

    /// Run `work` against the workspace and release it afterwards, whatever
    /// the outcome. An error from `work` takes precedence over a cleanup
    /// error, which is then only logged.
    pub fn scope<T>(mut self, work: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let outcome = work(&mut self);
        let released = self.close();
        match (outcome, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(cleanup_err)) => {
                warn!(error = %cleanup_err, "cleanup failed after an earlier error");
                Err(e)
            }
        }
    }

    /// Run cleanup once.
    fn release(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        info!(workspace = %self.name, changes = self.scratch.len(), "releasing scratch workspace");
        cleanup::cleanup(self.vcs, &self.path, &self.name, &self.scratch)
    }
}

impl Drop for WorkspaceGuard<'_> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        warn!(workspace = %self.name, "scratch workspace dropped without close");
        if let Err(e) = self.release() {
            warn!(workspace = %self.name, error = %e, "best-effort cleanup failed");
        }
    }
}
