use std::cell::RefCell;

use libjjrun::{Change, CommandOutput, ErrorStrategy, RunObserver, RunReport};
use liboutput::{Output, OutputError, Spinner};
use tracing::warn;

/// Log a failed write instead of interrupting the run.
pub fn emit(result: Result<(), OutputError>) {
    if let Err(e) = result {
        warn!(error = %e, "failed to write output");
    }
}

/// Renders run progress through an [`Output`].
pub struct TerminalObserver<'a> {
    /// Destination for every message.
    output: &'a dyn Output,
    /// Spinner for the command currently running, if any.
    spinner: RefCell<Option<Spinner>>,
}

impl<'a> TerminalObserver<'a> {
    /// Create an observer writing to `output`.
    pub fn new(output: &'a dyn Output) -> Self {
        Self {
            output,
            spinner: RefCell::new(None),
        }
    }

    /// Print non-empty captured stdout and stderr, each in its own section.
    fn captured(&self, result: &CommandOutput) {
        for (label, text) in [("stdout", &result.stdout), ("stderr", &result.stderr)] {
            let text = text.trim_end();
            if text.is_empty() {
                continue;
            }
            match self.output.section(&format!("{label}:")) {
                Ok(section) => emit(section.verbatim(text)),
                Err(e) => emit(Err(e)),
            }
        }
    }
}

impl RunObserver for TerminalObserver<'_> {
    fn operation_recorded(&self, operation: &str) {
        emit(self.output.message(&format!("Current operation: {operation}")));
    }

    fn nothing_to_do(&self) {
        emit(self.output.message("No changes found to process."));
    }

    fn processing(&self, index: usize, total: usize, change: &Change) {
        emit(self.output.message(&format!(
            "Processing change {}: {}",
            change.short_id(),
            change.summary()
        )));
        let spinner = self
            .output
            .spinner(&format!("[{}/{total}] running command", index + 1));
        *self.spinner.borrow_mut() = Some(spinner);
    }

    fn command_finished(&self, _change: &Change, result: &CommandOutput) {
        let spinner = self
            .spinner
            .borrow_mut()
            .take()
            .unwrap_or_else(Spinner::silent);
        if result.success() {
            emit(spinner.finish_success("Command succeeded"));
        } else {
            emit(spinner.finish_fail(&format!(
                "Command failed with return code {}",
                result.code
            )));
        }
        self.captured(result);
    }

    fn command_failed(&self, change: &Change, _result: &CommandOutput, strategy: ErrorStrategy) {
        let id = change.short_id();
        let msg = match strategy {
            ErrorStrategy::Continue => format!("Error while processing change [{id}]"),
            ErrorStrategy::Stop => format!("Stopped on change [with fail] {id}"),
            ErrorStrategy::Fatal => format!("Fatal error at change [{id}]"),
        };
        match strategy {
            ErrorStrategy::Continue => emit(self.output.warn(&msg)),
            ErrorStrategy::Stop | ErrorStrategy::Fatal => emit(self.output.fail(&msg)),
        }
    }
}

/// Print the closing summary and the commands for undoing the run.
pub fn render_summary(output: &dyn Output, report: &RunReport) {
    if report.candidates == 0 {
        return;
    }

    let summary = format!(
        "Rewrote {} of {} changes ({} left untouched)",
        report.modified,
        report.candidates,
        report.untouched()
    );
    if report.all_succeeded() {
        emit(output.success(&summary));
    } else {
        emit(output.warn(&summary));
        let failed = report
            .failures
            .iter()
            .map(|f| format!("{} (code {})", f.change.short_id(), f.output.code))
            .collect::<Vec<_>>()
            .join(", ");
        emit(output.warn(&format!("Failed changes: {failed}")));
    }

    match (&report.operation_before, &report.operation_after) {
        (Some(before), Some(after)) => {
            emit(output.message(&format!("To undo: jj op restore {before}")));
            emit(output.message(&format!(
                "To inspect: jj op diff --from {before} --to {after}"
            )));
        }
        _ => emit(output.warn(
            "Operation identifiers unavailable; use `jj op log` to find the run",
        )),
    }
}
