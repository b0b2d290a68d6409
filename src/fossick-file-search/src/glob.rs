//! Glob compilation and the two file-pattern matching strategies.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use globset::GlobBuilder;

use crate::error::{Error, Result};

/// How a glob query obtains its candidate file list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GlobMode {
    /// Hand the pattern to the external path enumerator and let it walk the
    /// tree. Results are ordered by modification time, newest first.
    Enumerate,

    /// Filter the cached file listing in-process. Results keep the cached
    /// listing's lexicographic order.
    #[default]
    CachedList,
}

/// Options for a glob query.
#[derive(Debug, Clone)]
pub struct GlobOptions {
    /// Directory (relative to the root) the pattern is anchored under.
    /// `None` anchors at the root itself.
    pub anchor: Option<PathBuf>,

    /// Whether matching distinguishes case. Defaults to insensitive, which
    /// is what interactive queries nearly always want.
    pub case_sensitive: bool,

    /// Candidate-list strategy.
    pub mode: GlobMode,

    /// Whether ignore rules are consulted when building the candidate list.
    pub respect_ignore: bool,
}

impl Default for GlobOptions {
    fn default() -> Self {
        Self {
            anchor: None,
            case_sensitive: false,
            mode: GlobMode::default(),
            respect_ignore: true,
        }
    }
}

/// A compiled glob pattern, anchored and ready to test root-relative paths.
#[derive(Debug, Clone)]
pub struct CompiledGlob {
    pattern: String,
    matcher: globset::GlobMatcher,
}

impl CompiledGlob {
    /// Compiles a pattern, joining it under the anchor directory when one
    /// is given. `*` never crosses path separators; `**` does.
    pub fn compile(pattern: &str, anchor: Option<&Path>, case_sensitive: bool) -> Result<Self> {
        let joined = join_anchor(pattern, anchor);
        let glob = GlobBuilder::new(&joined)
            .literal_separator(true)
            .case_insensitive(!case_sensitive)
            .build()
            .map_err(|e| Error::pattern(pattern, e.to_string()))?;
        Ok(Self {
            pattern: joined,
            matcher: glob.compile_matcher(),
        })
    }

    /// The anchored pattern text, as handed to the matcher.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Tests a root-relative path.
    pub fn is_match(&self, path: &Path) -> bool {
        self.matcher.is_match(path)
    }
}

fn join_anchor(pattern: &str, anchor: Option<&Path>) -> String {
    match anchor {
        Some(anchor) if !anchor.as_os_str().is_empty() => {
            let prefix = anchor.to_string_lossy().replace('\\', "/");
            format!("{}/{}", prefix.trim_end_matches('/'), pattern)
        }
        _ => pattern.to_string(),
    }
}

/// Sorts root-relative paths by modification time, newest first, breaking
/// ties lexicographically. Paths whose metadata cannot be read sort last.
pub(crate) fn sort_newest_first(root: &Path, files: &mut Vec<PathBuf>) {
    let mut keyed: Vec<(SystemTime, PathBuf)> = std::mem::take(files)
        .into_iter()
        .map(|p| {
            let mtime = std::fs::metadata(root.join(&p))
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH);
            (mtime, p)
        })
        .collect();
    keyed.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));
    files.extend(keyed.into_iter().map(|(_, p)| p));
}
