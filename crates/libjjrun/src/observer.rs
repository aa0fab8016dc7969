use crate::{change::Change, exec::CommandOutput, strategy::ErrorStrategy};

/// Hooks through which a run reports progress.
///
/// The library never prints; frontends implement this trait to render what
/// is happening. Every method has a no-op default.
pub trait RunObserver {
    /// The operation log head was recorded before the run started.
    fn operation_recorded(&self, _operation: &str) {}

    /// The target selection resolved to no changes.
    fn nothing_to_do(&self) {}

    /// Change `index` (zero-based) of `total` is about to be processed.
    fn processing(&self, _index: usize, _total: usize, _change: &Change) {}

    /// The user command finished for `change`, successfully or not.
    fn command_finished(&self, _change: &Change, _output: &CommandOutput) {}

    /// The user command failed for `change` and `strategy` was applied.
    fn command_failed(&self, _change: &Change, _output: &CommandOutput, _strategy: ErrorStrategy) {}

    /// The snapshot produced for an input change was examined by the rewriter.
    fn rewritten(&self, _change: &Change, _modified: bool) {}
}

/// Observer that ignores every event.
pub struct Silent;

impl RunObserver for Silent {}
