//! Time-bounded cache of enumerated file lists.
//!
//! Entries are keyed by `(respect_ignore, subtree)` and expire strictly by
//! age: no LRU, no partial invalidation. An entry is always replaced as a
//! whole, so a reader never observes a half-written list. The cache is
//! owned by its discovery context and discarded with it; there is no
//! process-wide singleton.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Fixed default time-to-live for cached file listings.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(10);

/// Cache key: which ignore mode produced the listing, and for which subtree.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Whether ignore rules were consulted during the crawl.
    pub respect_ignore: bool,

    /// Subtree relative to the root, with `/` separators. Empty for the
    /// root itself.
    pub subtree: String,
}

impl CacheKey {
    /// Creates a key, normalizing the subtree to forward slashes.
    pub fn new(respect_ignore: bool, subtree: &Path) -> Self {
        Self {
            respect_ignore,
            subtree: subtree.to_string_lossy().replace('\\', "/"),
        }
    }
}

/// One cached listing.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    created_at: Instant,
    files: Vec<PathBuf>,
}

impl CacheEntry {
    fn new(files: Vec<PathBuf>) -> Self {
        Self {
            created_at: Instant::now(),
            files,
        }
    }

    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() >= ttl
    }
}

/// Cache for file listings with a fixed TTL.
#[derive(Debug)]
pub struct FileListCache {
    entries: HashMap<CacheKey, CacheEntry>,
    ttl: Duration,
}

impl FileListCache {
    /// Creates an empty cache with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            ttl,
        }
    }

    /// Creates an empty cache with the default 10 second TTL.
    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_CACHE_TTL)
    }

    /// Returns the cached listing for a key if it is still fresh.
    pub fn get(&self, key: &CacheKey) -> Option<&[PathBuf]> {
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired(self.ttl) => {
                tracing::debug!(subtree = %key.subtree, "file list cache hit");
                Some(&entry.files)
            }
            _ => None,
        }
    }

    /// Stores a listing, replacing any prior entry for the key as a whole.
    pub fn insert(&mut self, key: CacheKey, files: Vec<PathBuf>) {
        self.entries.insert(key, CacheEntry::new(files));
    }

    /// Drops all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of entries, fresh or expired.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
