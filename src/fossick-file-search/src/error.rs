//! Error types for file discovery and search operations.

use std::path::PathBuf;

use fossick_ripgrep::MatcherError;

/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during discovery and search operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A glob or regex pattern failed to compile.
    ///
    /// Always raised before any filesystem access or process spawn.
    #[error("invalid pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    /// A target path failed precondition checks (missing, not a directory,
    /// or outside the allowed root).
    #[error("invalid path '{path}': {reason}")]
    PathValidation { path: PathBuf, reason: String },

    /// An ignore rule was structurally invalid.
    #[error("malformed ignore rule '{rule}': {reason}")]
    MalformedRule { rule: String, reason: String },

    /// The crawl root itself could not be read.
    #[error("crawl root unavailable '{path}': {source}")]
    RootUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The operation was aborted via its cancellation token.
    #[error("operation cancelled")]
    Cancelled,

    /// A crawl worker terminated before replying.
    #[error("crawl worker terminated before replying")]
    WorkerGone,

    /// A rule set could not be encoded or decoded.
    #[error("rule set serialization failed: {0}")]
    RuleSet(#[from] serde_json::Error),

    /// The external matcher collaborator failed.
    #[error(transparent)]
    Matcher(MatcherError),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a new `Pattern` error.
    pub fn pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `PathValidation` error.
    pub fn path_validation(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::PathValidation {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `MalformedRule` error.
    pub fn malformed_rule(rule: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedRule {
            rule: rule.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `RootUnavailable` error.
    pub fn root_unavailable(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::RootUnavailable {
            path: path.into(),
            source,
        }
    }

    /// Returns whether this error represents cancellation rather than a
    /// genuine failure, so callers can treat user-initiated aborts
    /// differently.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled) || matches!(self, Self::Matcher(m) if m.is_cancelled())
    }
}

impl From<MatcherError> for Error {
    fn from(err: MatcherError) -> Self {
        // Cancellation keeps its identity across the collaborator boundary.
        match err {
            MatcherError::Cancelled => Self::Cancelled,
            other => Self::Matcher(other),
        }
    }
}
