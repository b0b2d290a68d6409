//! Error types for the external matcher collaborator.

use std::path::PathBuf;

/// Result type alias for matcher operations.
pub type MatcherResult<T> = std::result::Result<T, MatcherError>;

/// Errors that can occur while driving the external matcher process.
#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    /// The executable could not be located or started.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The process exited with a code outside {0, 1}.
    ///
    /// Exit code 1 means "no results" and is not an error; anything else is
    /// an execution failure whose diagnostic output is carried verbatim.
    #[error("matcher exited with code {code}: {stderr}")]
    ProcessExit { code: i32, stderr: String },

    /// The operation was aborted via its cancellation token.
    #[error("matcher invocation cancelled")]
    Cancelled,

    /// I/O error while communicating with the process.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MatcherError {
    /// Creates a new `Spawn` error.
    pub fn spawn(program: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    /// Creates a new `ProcessExit` error.
    pub fn process_exit(code: i32, stderr: impl Into<String>) -> Self {
        Self::ProcessExit {
            code,
            stderr: stderr.into(),
        }
    }

    /// Returns whether this error represents cancellation rather than a
    /// genuine failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
