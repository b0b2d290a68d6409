//! Configuration for the discovery context.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::DEFAULT_CACHE_TTL;

/// Directories that are never searched for content, regardless of ignore
/// rule configuration. Version control metadata and dependency trees.
pub const ALWAYS_EXCLUDED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "node_modules",
    "target",
    "vendor",
    "__pycache__",
];

/// Name of the ignore-rule file read from the root on each crawl.
pub const IGNORE_FILE_NAME: &str = ".gitignore";

/// Configuration for a [`FileDiscovery`](crate::FileDiscovery) context.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Root directory this context is scoped to. No result ever escapes it.
    pub root: PathBuf,

    /// Number of parallel crawl workers. A pool of one still gives
    /// non-blocking dispatch but serializes crawl jobs.
    pub crawl_workers: usize,

    /// Maximum depth to descend below the crawled subtree.
    /// `None` means unlimited depth.
    pub max_depth: Option<usize>,

    /// Time-to-live for cached file listings.
    pub cache_ttl: Duration,

    /// Directories always excluded from content search.
    pub excluded_dirs: Vec<String>,
}

impl DiscoveryConfig {
    /// Creates a configuration with defaults for the given root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            crawl_workers: 2,
            max_depth: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            excluded_dirs: ALWAYS_EXCLUDED_DIRS.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Creates a builder for constructing a configuration.
    pub fn builder(root: impl Into<PathBuf>) -> DiscoveryConfigBuilder {
        DiscoveryConfigBuilder::new(root)
    }
}

/// Builder for creating `DiscoveryConfig` instances.
#[derive(Debug)]
pub struct DiscoveryConfigBuilder {
    config: DiscoveryConfig,
}

impl DiscoveryConfigBuilder {
    /// Creates a new builder with the specified root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            config: DiscoveryConfig::new(root),
        }
    }

    /// Sets the number of crawl workers (minimum one).
    pub fn crawl_workers(mut self, workers: usize) -> Self {
        self.config.crawl_workers = workers.max(1);
        self
    }

    /// Sets the maximum crawl depth.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.max_depth = Some(depth);
        self
    }

    /// Sets the cache time-to-live. Mainly useful for tests.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    /// Replaces the always-excluded directory list for content search.
    pub fn excluded_dirs(mut self, dirs: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.config.excluded_dirs = dirs.into_iter().map(Into::into).collect();
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> DiscoveryConfig {
        self.config
    }
}
