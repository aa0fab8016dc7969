use tracing::{debug, info};

use crate::{
    change::{self, Change},
    error::Result,
    exec::CommandOutput,
    observer::RunObserver,
    strategy::{ErrorStrategy, Transition},
    workspace::WorkspaceGuard,
};

/// A user-command failure recorded during a batch.
#[derive(Debug, Clone)]
pub struct Failure {
    /// The input change the command ran against.
    pub change: Change,
    /// What the command printed and how it exited.
    pub output: CommandOutput,
}

/// Why a batch ended before reaching the last change.
#[derive(Debug, Clone)]
pub enum Halt {
    /// The `stop` strategy ended the batch; the failing change's result is kept.
    Stopped(Failure),
    /// The `fatal` strategy ended the batch; the failing change's result is discarded.
    Aborted(Failure),
}

impl Halt {
    /// The failure that ended the batch.
    pub fn failure(&self) -> &Failure {
        match self {
            Self::Stopped(failure) | Self::Aborted(failure) => failure,
        }
    }
}

/// Outcome of running the user command across the selected changes.
#[derive(Debug, Default)]
pub struct Batch {
    /// Snapshots produced in the scratch workspace, in processing order.
    pub new_changes: Vec<Change>,
    /// Every recorded failure, including the one that halted the batch.
    pub failures: Vec<Failure>,
    /// Set when a strategy ended the batch early.
    pub halt: Option<Halt>,
    /// Number of input changes the command actually ran against.
    pub attempted: usize,
    /// Length of the prefix of `new_changes` that may be spliced back.
    rewritable: usize,
}

impl Batch {
    /// Whether every attempted command exited successfully.
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Snapshots to hand to the rewriter.
    pub fn rewritable(&self) -> &[Change] {
        &self.new_changes[..self.rewritable]
    }
}

/// Run `command` once per change, each time on a fresh child of that change
/// in the scratch workspace.
///
/// Changes are handled strictly in the given order. Every snapshot produced
/// is tracked on `workspace` for abandonment. Failures of the user command
/// are governed by `strategy`; failures of jj end the batch with `Err`.
pub fn process(
    workspace: &mut WorkspaceGuard<'_>,
    changes: &[Change],
    command: &str,
    strategy: ErrorStrategy,
    observer: &dyn RunObserver,
) -> Result<Batch> {
    let vcs = workspace.vcs();
    let path = workspace.path().to_path_buf();
    let total = changes.len();
    let mut batch = Batch::default();

    for (index, change) in changes.iter().enumerate() {
        info!(change = change.short_id(), index, total, "processing change");
        observer.processing(index, total, change);

        vcs.new_change(&change.change_id, &path)?;
        let output = vcs.run_user_command(command, &path)?;
        batch.attempted += 1;
        observer.command_finished(change, &output);

        let transition = if output.success() {
            Transition::Proceed
        } else {
            observer.command_failed(change, &output, strategy);
            strategy.on_failure()
        };

        let produced = change::resolve(vcs, "@", &path)?;
        debug!(change = change.short_id(), produced = produced.len(), "captured snapshot");
        workspace.track(&produced);
        batch.new_changes.extend(produced);
        if transition != Transition::Abort {
            batch.rewritable = batch.new_changes.len();
        }

        if output.success() {
            continue;
        }

        let failure = Failure {
            change: change.clone(),
            output,
        };
        batch.failures.push(failure.clone());
        match transition {
            Transition::Proceed => {}
            Transition::Stop => {
                batch.halt = Some(Halt::Stopped(failure));
                break;
            }
            Transition::Abort => {
                batch.halt = Some(Halt::Aborted(failure));
                break;
            }
        }
    }

    Ok(batch)
}
