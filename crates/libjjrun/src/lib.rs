#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
//! Core library for jj-run: map a shell command over a set of jj changes.
//!
//! Each selected change gets a fresh child in an isolated scratch workspace,
//! the command runs there, and any content it produces is spliced back into
//! the original change while descendants keep their content. The scratch
//! workspace and every change created through it are removed afterwards.
//!
//! The library never prints. Progress is reported through [`RunObserver`];
//! the CLI binary in `crates/jj-run` renders it.

/// Running the user command over every selected change.
mod batch;
/// Parsing `jj log` output into change records.
mod change;
/// Teardown of scratch workspaces.
mod cleanup;
/// Error type and exit-code mapping.
mod error;
/// Process execution helpers.
mod exec;
/// The jj command-line gateway.
mod jj;
/// Progress hooks.
mod observer;
/// Splicing snapshots back into their parents.
mod rewrite;
/// Top-level run orchestration.
mod runner;
/// Error strategies and the transitions they select.
mod strategy;
/// Scratch workspace lifecycle.
mod workspace;

/// In-memory gateway for unit tests.
#[cfg(test)]
mod testing;

pub use batch::{Batch, Failure, Halt};
pub use change::{Change, parse_changes, short_id};
pub use error::{JjRunError, Result};
pub use exec::CommandOutput;
pub use jj::{Jj, Vcs, find_root};
pub use observer::{RunObserver, Silent};
pub use runner::{RunReport, RunRequest, Runner};
pub use strategy::{ErrorStrategy, Transition};
pub use workspace::{SCRATCH_PREFIX, WorkspaceGuard};
