use std::fmt;

/// Policy applied when the user command fails for a change.
///
/// Fixed for the lifetime of a run. It only governs user-command failures;
/// failures of jj itself always abort the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorStrategy {
    /// Record the failure and move on to the next change.
    #[default]
    Continue,
    /// Finish the current change, then stop and report a nonzero exit.
    Stop,
    /// Abort the run, exiting with the failing command's exit code.
    Fatal,
}

/// What the batch loop does after a change has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Move on to the next change.
    Proceed,
    /// Leave the loop after this change; keep its result.
    Stop,
    /// Leave the loop after this change; discard its result and abort the run.
    Abort,
}

impl ErrorStrategy {
    /// Transition taken after a failed user command.
    pub fn on_failure(self) -> Transition {
        match self {
            Self::Continue => Transition::Proceed,
            Self::Stop => Transition::Stop,
            Self::Fatal => Transition::Abort,
        }
    }

    /// Name used on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Stop => "stop",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for ErrorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
