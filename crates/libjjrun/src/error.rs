use std::{io, result::Result as StdResult};
use thiserror::Error;

/// Custom Result type for jj-run operations.
pub type Result<T> = StdResult<T, JjRunError>;

/// jj-run specific error types
#[derive(Error, Debug)]
pub enum JjRunError {
    /// The user command failed under the `fatal` strategy and the run was aborted.
    #[error("Fatal error at change [{change}]: command exited with status code {code}")]
    CommandExit {
        /// Short identity of the change being processed when the command failed.
        change: String,
        /// The process exit status code.
        code: i32,
    },

    /// The user command failed under the `stop` strategy; work done so far was kept.
    #[error("Stopped on change [{change}]: command exited with status code {code}")]
    Stopped {
        /// Short identity of the change the run stopped on.
        change: String,
        /// The process exit status code.
        code: i32,
    },

    /// An internal jj operation failed.
    #[error("jj error: {0}")]
    Tool(String),

    /// A contextual precondition failed (e.g. not inside a jj repo).
    #[error("Context error: {0}")]
    Context(String),

    /// An underlying I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl JjRunError {
    /// Return the recommended process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::CommandExit { code, .. } | Self::Stopped { code, .. } => nonzero(*code),
            Self::Context(_) => 2,
            Self::Tool(_) => 4,
            Self::Io(_) => 1,
        }
    }
}

/// Clamp an exit code so a recorded failure never maps to success.
fn nonzero(code: i32) -> i32 {
    if code == 0 { 1 } else { code }
}

/// Map gateway errors into a `JjRunError::Tool`, keeping the context chain.
pub fn tool_error(error: &anyhow::Error) -> JjRunError {
    JjRunError::Tool(format!("{error:#}"))
}
