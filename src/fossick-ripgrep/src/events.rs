//! Structured event model for the matcher's JSON output stream.
//!
//! In content-match mode the collaborator emits one JSON object per line,
//! discriminated by a `type` field. Only `match` events carry data the
//! search engine cares about; the other kinds are decoded loosely so that a
//! newer matcher adding fields never breaks parsing.

use serde::Deserialize;

/// Loosely decoded payload for event kinds we pass over.
pub type EventBody = serde_json::Value;

/// One event from the matcher's structured output stream.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Event {
    /// A file is about to be reported.
    Begin(EventBody),

    /// One or more matched lines within a file.
    Match(MatchData),

    /// A context line surrounding a match.
    Context(EventBody),

    /// A file has been fully reported.
    End(EventBody),

    /// Final statistics for the whole run.
    Summary(EventBody),
}

impl Event {
    /// Returns the match data if this is a `match` event.
    pub fn into_match(self) -> Option<MatchData> {
        match self {
            Self::Match(data) => Some(data),
            _ => None,
        }
    }
}

/// Data carried by a `match` event.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchData {
    /// Path of the file containing the match, relative to the invocation's
    /// working directory.
    pub path: TextPayload,

    /// The raw matched text. May contain embedded line breaks when the
    /// match spans multiple lines.
    pub lines: TextPayload,

    /// 1-based line number where the matched text starts.
    pub line_number: Option<u64>,
}

/// A text payload that may be absent when the matcher could not decode the
/// underlying bytes as UTF-8.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextPayload {
    #[serde(default)]
    pub text: Option<String>,
}
