use std::path::PathBuf;

use tracing::{info, warn};

use crate::{
    batch::{self, Failure, Halt},
    change,
    error::{JjRunError, Result},
    jj::Vcs,
    observer::RunObserver,
    rewrite,
    strategy::ErrorStrategy,
    workspace::WorkspaceGuard,
};

/// What to run and where.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Revset naming the changes to process.
    pub selection: String,
    /// Shell command run once per change.
    pub command: String,
    /// Policy for failures of the command.
    pub strategy: ErrorStrategy,
}

/// Summary of a completed run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Number of changes the selection resolved to.
    pub candidates: usize,
    /// Number of changes the command ran against.
    pub attempted: usize,
    /// Number of changes whose content was rewritten.
    pub modified: usize,
    /// Every recorded command failure.
    pub failures: Vec<Failure>,
    /// Set when the `stop` or `fatal` strategy ended the run early.
    pub halt: Option<Halt>,
    /// Operation log head before the run, if it could be read.
    pub operation_before: Option<String>,
    /// Operation log head after the run, if it could be read.
    pub operation_after: Option<String>,
}

impl RunReport {
    /// Candidates that were not rewritten.
    pub fn untouched(&self) -> usize {
        self.candidates.saturating_sub(self.modified)
    }

    /// Whether every attempted command exited successfully.
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Convert an early stop into the error the process should exit with.
    pub fn status(&self) -> Result<()> {
        match &self.halt {
            None => Ok(()),
            Some(Halt::Stopped(failure)) => Err(JjRunError::Stopped {
                change: failure.change.short_id().to_string(),
                code: failure.output.code,
            }),
            Some(Halt::Aborted(failure)) => Err(JjRunError::CommandExit {
                change: failure.change.short_id().to_string(),
                code: failure.output.code,
            }),
        }
    }
}

/// Drives a complete run against one repository.
pub struct Runner<V: Vcs> {
    /// Gateway into the repository.
    vcs: V,
    /// Directory under which scratch workspaces are created.
    scratch_root: PathBuf,
}

impl<V: Vcs> Runner<V> {
    /// Create a runner that places scratch workspaces under `scratch_root`.
    pub fn new(vcs: V, scratch_root: PathBuf) -> Self {
        Self { vcs, scratch_root }
    }

    /// The gateway this runner uses.
    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    /// Run `request` to completion.
    ///
    /// The scratch workspace and every change created through it are removed
    /// before this returns, on success and on failure. A command failure
    /// under `stop` or `fatal` still yields a report; [`RunReport::status`]
    /// turns it into the error the process exits with.
    pub fn run(&self, request: &RunRequest, observer: &dyn RunObserver) -> Result<RunReport> {
        let operation_before = self.operation_marker();
        if let Some(op) = &operation_before {
            observer.operation_recorded(op);
        }

        let workspace = WorkspaceGuard::open(&self.vcs, &self.scratch_root)?;
        let revset = workspace.narrow(&request.selection);
        info!(
            workspace = workspace.name(),
            revset = %revset,
            strategy = %request.strategy,
            "resolving targets"
        );

        let mut report = workspace.scope(|ws| {
            let targets = change::resolve(ws.vcs(), &revset, self.vcs.repo_dir())?;
            let mut report = RunReport {
                candidates: targets.len(),
                ..RunReport::default()
            };
            if targets.is_empty() {
                observer.nothing_to_do();
                return Ok(report);
            }

            let done = batch::process(ws, &targets, &request.command, request.strategy, observer)?;
            report.modified = rewrite::rewrite(ws.vcs(), ws.path(), done.rewritable(), observer)?;
            report.attempted = done.attempted;
            report.failures = done.failures;
            report.halt = done.halt;
            Ok(report)
        })?;

        report.operation_before = operation_before;
        report.operation_after = self.operation_marker();
        Ok(report)
    }

    /// Read the operation log head, degrading to `None` with a warning.
    fn operation_marker(&self) -> Option<String> {
        match self.vcs.current_operation() {
            Ok(id) if !id.is_empty() => Some(id),
            Ok(_) => {
                warn!("operation log returned an empty identifier");
                None
            }
            Err(e) => {
                warn!(error = %e, "could not read the operation log");
                None
            }
        }
    }
}
