//! The discovery façade: file listing, glob queries, and content search
//! scoped to one root directory.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use fossick_ripgrep::{EnumerateRequest, GlobFilter, LineMatcher, PathEnumerator, RipgrepTool};

use crate::cache::{CacheKey, FileListCache};
use crate::config::{DiscoveryConfig, IGNORE_FILE_NAME};
use crate::content::ContentSearchEngine;
use crate::crawl::{CrawlPool, CrawlRequest};
use crate::error::{Error, Result};
use crate::glob::{sort_newest_first, CompiledGlob, GlobMode, GlobOptions};
use crate::ignore_rules::IgnoreRuleSet;
use crate::report::SearchReport;

/// File discovery and search scoped to a single root directory.
///
/// One instance owns its cache and worker pool; dropping it releases both.
/// No query result ever refers to a path outside the configured root.
pub struct FileDiscovery {
    config: DiscoveryConfig,
    cache: Mutex<FileListCache>,
    pool: CrawlPool,
    enumerator: Arc<dyn PathEnumerator>,
    content: ContentSearchEngine,
}

impl FileDiscovery {
    /// Creates a discovery context backed by the `rg` executable found on
    /// the search path.
    pub fn new(config: DiscoveryConfig) -> Result<Self> {
        let tool = Arc::new(RipgrepTool::locate()?);
        Ok(Self::with_tools(config, tool.clone(), tool))
    }

    /// Creates a discovery context with explicit collaborators. Primarily
    /// for tests that substitute stub tools.
    pub fn with_tools(
        config: DiscoveryConfig,
        enumerator: Arc<dyn PathEnumerator>,
        matcher: Arc<dyn LineMatcher>,
    ) -> Self {
        let cache = Mutex::new(FileListCache::new(config.cache_ttl));
        let pool = CrawlPool::new(config.crawl_workers);
        let content = ContentSearchEngine::new(matcher, config.excluded_dirs.clone());
        Self {
            config,
            cache,
            pool,
            enumerator,
            content,
        }
    }

    /// Returns the root directory this context is scoped to.
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    /// Lists files under a subtree of the root, serving from the cache when
    /// a fresh listing exists.
    ///
    /// Returned paths are relative to the root and sorted. Two concurrent
    /// misses on the same key may both crawl; the later insert wins, which
    /// is harmless since both observed the same tree.
    pub async fn list_files(
        &self,
        respect_ignore: bool,
        subtree: &Path,
        cancel: &CancellationToken,
    ) -> Result<Vec<PathBuf>> {
        validate_relative(subtree)?;
        let key = CacheKey::new(respect_ignore, subtree);

        if let Some(files) = self.cache.lock().await.get(&key) {
            return Ok(files.to_vec());
        }

        let rules = self.load_root_rules()?;
        let request = CrawlRequest {
            root: self.config.root.clone(),
            subtree: subtree.to_path_buf(),
            max_depth: self.config.max_depth,
            rules,
            respect_ignore,
        };
        let files = self.pool.submit(request, cancel).await?;

        self.cache.lock().await.insert(key, files.clone());
        Ok(files)
    }

    /// Finds files matching a glob pattern.
    ///
    /// In [`GlobMode::Enumerate`] the external enumerator walks the tree and
    /// results come back newest-first by modification time. In
    /// [`GlobMode::CachedList`] the cached listing is filtered in-process
    /// and keeps its sorted order.
    pub async fn glob_files(
        &self,
        pattern: &str,
        options: &GlobOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<PathBuf>> {
        // Compile before touching the filesystem so a bad pattern is always
        // reported as such.
        let anchor = options.anchor.as_deref();
        if let Some(anchor) = anchor {
            validate_relative(anchor)?;
        }
        let glob = CompiledGlob::compile(pattern, anchor, options.case_sensitive)?;

        match options.mode {
            GlobMode::Enumerate => {
                let request = EnumerateRequest {
                    directory: self.config.root.clone(),
                    globs: vec![GlobFilter::include(glob.pattern())],
                    bypass_ignore: !options.respect_ignore,
                    case_insensitive: !options.case_sensitive,
                };
                let mut files: Vec<PathBuf> = self
                    .enumerator
                    .enumerate(&request, cancel)
                    .await?
                    .into_iter()
                    .filter(|p| is_within_root(p))
                    .collect();
                sort_newest_first(&self.config.root, &mut files);
                Ok(files)
            }
            GlobMode::CachedList => {
                let files = self
                    .list_files(options.respect_ignore, Path::new(""), cancel)
                    .await?;
                Ok(files.into_iter().filter(|p| glob.is_match(p)).collect())
            }
        }
    }

    /// Searches file contents under a directory for a regex pattern.
    ///
    /// `directory` is resolved against the root when relative; `None`
    /// searches the root itself. The directory must exist and lie within
    /// the root.
    pub async fn search_content(
        &self,
        pattern: &str,
        directory: Option<&Path>,
        include_glob: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<SearchReport> {
        let target = self.resolve_search_dir(directory)?;
        self.content
            .search(pattern, &target, include_glob, cancel)
            .await
    }

    /// Drops all cached file listings.
    pub async fn invalidate_cache(&self) {
        self.cache.lock().await.clear();
    }

    fn resolve_search_dir(&self, directory: Option<&Path>) -> Result<PathBuf> {
        let target = match directory {
            None => self.config.root.clone(),
            Some(dir) if dir.is_absolute() => dir.to_path_buf(),
            Some(dir) => {
                validate_relative(dir)?;
                self.config.root.join(dir)
            }
        };
        if !target.starts_with(&self.config.root) {
            return Err(Error::path_validation(
                target,
                "outside the project root",
            ));
        }
        if !target.is_dir() {
            return Err(Error::path_validation(target, "not a directory"));
        }
        Ok(target)
    }

    /// Reads the root ignore file for this crawl. A missing file simply
    /// means no root-level rules.
    fn load_root_rules(&self) -> Result<IgnoreRuleSet> {
        let path = self.config.root.join(IGNORE_FILE_NAME);
        match std::fs::read_to_string(&path) {
            Ok(source) => IgnoreRuleSet::parse(&source),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Ok(IgnoreRuleSet::default())
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl std::fmt::Debug for FileDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileDiscovery")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn validate_relative(path: &Path) -> Result<()> {
    if path.is_absolute() {
        return Err(Error::path_validation(path, "must be relative to the root"));
    }
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return Err(Error::path_validation(
            path,
            "parent-directory components are not allowed",
        ));
    }
    Ok(())
}

fn is_within_root(path: &Path) -> bool {
    !path.is_absolute() && !path.components().any(|c| matches!(c, Component::ParentDir))
}
