//! Content search over the external line matcher's event stream.
//!
//! The engine validates the query regex locally before anything is spawned,
//! hands the search to the collaborator, and folds its newline-delimited
//! event stream into a grouped [`SearchReport`]. Malformed events are
//! logged and counted, never fatal.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;

use fossick_ripgrep::{Event, GlobFilter, LineMatchRequest, LineMatcher, MatchData};

use crate::error::{Error, Result};
use crate::report::{Match, MatchGroup, SearchReport};

/// Regex content search scoped to one directory.
#[derive(Clone)]
pub struct ContentSearchEngine {
    matcher: Arc<dyn LineMatcher>,
    excluded_dirs: Vec<String>,
}

impl ContentSearchEngine {
    /// Creates an engine backed by the given line matcher. The excluded
    /// directories are filtered out of every search regardless of ignore
    /// configuration.
    pub fn new(matcher: Arc<dyn LineMatcher>, excluded_dirs: Vec<String>) -> Self {
        Self {
            matcher,
            excluded_dirs,
        }
    }

    /// Searches file contents under `directory` for lines matching
    /// `pattern`, optionally restricted to files matching `include_glob`.
    pub async fn search(
        &self,
        pattern: &str,
        directory: &Path,
        include_glob: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<SearchReport> {
        // Validate the pattern before any process is spawned so a bad regex
        // fails fast with a dedicated error.
        regex::Regex::new(pattern).map_err(|e| Error::pattern(pattern, e.to_string()))?;

        let mut globs = Vec::new();
        if let Some(include) = include_glob {
            globs.push(GlobFilter::include(include));
        }
        for dir in &self.excluded_dirs {
            globs.push(GlobFilter::exclude(format!("**/{dir}/**")));
        }

        let request = LineMatchRequest {
            pattern: pattern.to_string(),
            directory: directory.to_path_buf(),
            globs,
            case_insensitive: false,
        };
        let output = self.matcher.match_lines(&request, cancel).await?;

        Ok(fold_events(&output.raw_events, directory))
    }
}

impl std::fmt::Debug for ContentSearchEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentSearchEngine")
            .field("excluded_dirs", &self.excluded_dirs)
            .finish_non_exhaustive()
    }
}

/// Folds raw event lines into a grouped report. Groups keep first-seen file
/// order; matches within a group are sorted by line number.
fn fold_events(raw_events: &[String], directory: &Path) -> SearchReport {
    let mut groups: IndexMap<PathBuf, Vec<Match>> = IndexMap::new();
    let mut total_matches = 0;
    let mut skipped_events = 0;

    for line in raw_events {
        if line.trim().is_empty() {
            continue;
        }
        let event: Event = match serde_json::from_str(line) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!("skipping malformed search event: {err}");
                skipped_events += 1;
                continue;
            }
        };
        let Some(data) = event.into_match() else {
            continue;
        };
        match expand_match(&data, directory) {
            // An event whose body collapses to zero lines (for example a
            // binary match with no textual payload) must not leave an empty
            // group behind.
            Some((_, matches)) if matches.is_empty() => {}
            Some((path, matches)) => {
                total_matches += matches.len();
                groups.entry(path).or_default().extend(matches);
            }
            None => {
                skipped_events += 1;
            }
        }
    }

    let groups = groups
        .into_iter()
        .map(|(path, mut matches)| {
            matches.sort_by_key(|m| m.line_number);
            MatchGroup { path, matches }
        })
        .collect();

    SearchReport {
        groups,
        total_matches,
        skipped_events,
    }
}

/// Expands one match event into per-line matches. A multi-line match body
/// becomes one entry per line, numbered from the event's starting line.
fn expand_match(data: &MatchData, directory: &Path) -> Option<(PathBuf, Vec<Match>)> {
    let Some(raw_path) = data.path.text.as_deref() else {
        tracing::warn!("skipping match event with non-textual path");
        return None;
    };
    let Some(line_number) = data.line_number else {
        tracing::warn!(path = raw_path, "skipping match event without line number");
        return None;
    };
    let path = normalize_path(raw_path, directory)?;

    let body = data.lines.text.as_deref().unwrap_or_default();
    let mut lines: Vec<&str> = body.split('\n').collect();
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    let matches = lines
        .iter()
        .enumerate()
        .map(|(offset, text)| Match {
            path: path.clone(),
            line_number: line_number + offset as u64,
            text: text.trim().to_string(),
        })
        .collect();
    Some((path, matches))
}

/// Normalizes a reported path to be relative to the searched directory.
/// Paths that resolve outside it are dropped.
fn normalize_path(raw: &str, directory: &Path) -> Option<PathBuf> {
    let trimmed = raw.strip_prefix("./").unwrap_or(raw);
    let path = Path::new(trimmed);

    let rel = if path.is_absolute() {
        match path.strip_prefix(directory) {
            Ok(rel) => rel,
            Err(_) => {
                tracing::warn!(path = raw, "dropping match outside the searched directory");
                return None;
            }
        }
    } else {
        path
    };

    if rel.components().any(|c| matches!(c, Component::ParentDir)) {
        tracing::warn!(path = raw, "dropping match with parent-directory components");
        return None;
    }
    Some(rel.to_path_buf())
}
