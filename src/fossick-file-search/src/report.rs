//! Search result types and report rendering.

use std::fmt::Write as _;
use std::path::PathBuf;

/// A single matched line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    /// File path relative to the search root.
    pub path: PathBuf,

    /// 1-based line number.
    pub line_number: u64,

    /// The matched line with surrounding whitespace trimmed.
    pub text: String,
}

/// All matches belonging to one file, ordered by ascending line number.
#[derive(Debug, Clone)]
pub struct MatchGroup {
    /// File path relative to the search root.
    pub path: PathBuf,

    /// Matches within the file, line numbers non-decreasing.
    pub matches: Vec<Match>,
}

/// A grouped, ordered content-search result.
#[derive(Debug, Clone, Default)]
pub struct SearchReport {
    /// Match groups in the order their files were first reported.
    pub groups: Vec<MatchGroup>,

    /// Total number of matched lines across all groups.
    pub total_matches: usize,

    /// Number of malformed stream events that were skipped.
    pub skipped_events: usize,
}

impl SearchReport {
    /// Returns whether the report contains no matches.
    pub fn is_empty(&self) -> bool {
        self.total_matches == 0
    }

    /// Renders the report as a single textual block.
    pub fn render(&self) -> String {
        if self.is_empty() {
            return "No matches found".to_string();
        }

        let mut out = format!(
            "Found {} match{}\n",
            self.total_matches,
            if self.total_matches == 1 { "" } else { "es" }
        );
        for group in &self.groups {
            let _ = writeln!(out, "{}:", group.path.display());
            for m in &group.matches {
                let _ = writeln!(out, "  {}: {}", m.line_number, m.text);
            }
        }
        out
    }
}
