#![allow(clippy::missing_errors_doc, clippy::uninlined_format_args)]
//! Fossick Ripgrep - external enumeration and line-matching collaborator.
//!
//! This crate wraps a ripgrep executable behind two narrow capability
//! interfaces: [`PathEnumerator`] for files-only enumeration and
//! [`LineMatcher`] for content pattern matching with structured JSON output.
//! Both are dyn-compatible so an in-process stub can stand in during tests
//! without the rest of the system noticing.
//!
//! The process is driven as a single awaitable call: stdout and stderr are
//! buffered internally and only exposed once the process exits. Exit code 0
//! means at least one result, exit code 1 means zero results (not an error),
//! and anything else surfaces the captured stderr verbatim.

mod error;
mod events;
mod invocation;
mod tool;

pub use error::{MatcherError, MatcherResult};
pub use events::{Event, EventBody, MatchData, TextPayload};
pub use invocation::{EnumerateRequest, GlobFilter, LineMatchRequest};
pub use tool::{LineMatcher, MatcherOutput, PathEnumerator, RipgrepTool};
