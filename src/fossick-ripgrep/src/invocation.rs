//! Request types and command-line construction for matcher invocations.

use std::path::{Path, PathBuf};

use tokio::process::Command;

/// One file-glob filter, optionally negated to exclude matching paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobFilter {
    /// The glob pattern, without any negation marker.
    pub pattern: String,

    /// When true the filter excludes matching paths instead of selecting
    /// them.
    pub negated: bool,
}

impl GlobFilter {
    /// Creates a filter that selects paths matching the pattern.
    pub fn include(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            negated: false,
        }
    }

    /// Creates a filter that excludes paths matching the pattern.
    pub fn exclude(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            negated: true,
        }
    }

    /// Renders the filter as a single glob flag value.
    pub fn flag_value(&self) -> String {
        if self.negated {
            format!("!{}", self.pattern)
        } else {
            self.pattern.clone()
        }
    }
}

/// A files-only enumeration request.
///
/// Successful output is a newline-delimited list of paths relative to
/// `directory`.
#[derive(Debug, Clone)]
pub struct EnumerateRequest {
    /// Directory the enumeration is scoped to; also the process working
    /// directory, so reported paths are relative to it.
    pub directory: PathBuf,

    /// Glob filters applied to the enumeration, in order.
    pub globs: Vec<GlobFilter>,

    /// When true, ignore rules are not consulted at all.
    pub bypass_ignore: bool,

    /// When true, glob filters match case-insensitively.
    pub case_insensitive: bool,
}

impl EnumerateRequest {
    /// Creates an enumeration request for a directory with no filters.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            globs: Vec::new(),
            bypass_ignore: false,
            case_insensitive: false,
        }
    }

    pub(crate) fn to_command(&self, program: &Path) -> Command {
        let mut cmd = Command::new(program);
        cmd.current_dir(&self.directory);
        // Hidden entries are always included; exclusion is the glob filters'
        // and ignore rules' job.
        cmd.arg("--files").arg("--hidden");
        if self.bypass_ignore {
            cmd.arg("--no-ignore");
        }
        let glob_flag = if self.case_insensitive { "--iglob" } else { "--glob" };
        for glob in &self.globs {
            cmd.arg(glob_flag).arg(glob.flag_value());
        }
        cmd
    }
}

/// A content-pattern-match request.
///
/// Output is the structured event stream described in [`crate::events`].
#[derive(Debug, Clone)]
pub struct LineMatchRequest {
    /// The regular expression to match lines against.
    pub pattern: String,

    /// Directory the search is scoped to; also the process working
    /// directory, so reported paths are relative to it.
    pub directory: PathBuf,

    /// Glob filters applied to candidate files, in order.
    pub globs: Vec<GlobFilter>,

    /// When true, the pattern matches case-insensitively.
    pub case_insensitive: bool,
}

impl LineMatchRequest {
    /// Creates a match request for a pattern under a directory.
    pub fn new(pattern: impl Into<String>, directory: impl Into<PathBuf>) -> Self {
        Self {
            pattern: pattern.into(),
            directory: directory.into(),
            globs: Vec::new(),
            case_insensitive: false,
        }
    }

    pub(crate) fn to_command(&self, program: &Path) -> Command {
        let mut cmd = Command::new(program);
        cmd.current_dir(&self.directory);
        cmd.arg("--json").arg("--hidden");
        if self.case_insensitive {
            cmd.arg("--ignore-case");
        }
        let glob_flag = if self.case_insensitive { "--iglob" } else { "--glob" };
        for glob in &self.globs {
            cmd.arg(glob_flag).arg(glob.flag_value());
        }
        // `-e` keeps patterns beginning with a dash from being read as flags.
        cmd.arg("-e").arg(&self.pattern);
        cmd
    }
}
