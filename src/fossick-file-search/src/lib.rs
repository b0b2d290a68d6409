#![allow(clippy::missing_errors_doc, clippy::uninlined_format_args)]
//! Ignore-rule-aware file discovery and content search for project trees.
//!
//! A [`FileDiscovery`] context is scoped to one root directory and offers
//! three queries: sorted file listings with a short-lived cache, glob
//! matching over either the cached listing or a fresh enumeration, and
//! regex content search driven by an external line matcher.

mod cache;
mod config;
mod content;
mod crawl;
mod discovery;
mod error;
mod glob;
mod ignore_rules;
mod report;

pub use cache::{CacheKey, FileListCache, DEFAULT_CACHE_TTL};
pub use config::{DiscoveryConfig, DiscoveryConfigBuilder, ALWAYS_EXCLUDED_DIRS, IGNORE_FILE_NAME};
pub use content::ContentSearchEngine;
pub use crawl::{crawl, CrawlPool, CrawlRequest};
pub use discovery::FileDiscovery;
pub use error::{Error, Result};
pub use glob::{CompiledGlob, GlobMode, GlobOptions};
pub use ignore_rules::{IgnoreMatcher, IgnoreRule, IgnoreRuleSet};
pub use report::{Match, MatchGroup, SearchReport};
