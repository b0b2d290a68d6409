//! Filesystem crawl and the worker pool that runs it.
//!
//! A crawl is a synchronous, depth-first walk of one subtree that yields
//! root-relative file paths in sorted order. Crawls run on a small pool of
//! workers; each job is handed to a worker as an immutable [`CrawlRequest`]
//! and the resulting listing travels back as a whole.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::config::IGNORE_FILE_NAME;
use crate::error::{Error, Result};
use crate::ignore_rules::{IgnoreMatcher, IgnoreRuleSet, IgnoreStack};

/// Everything a worker needs to perform one crawl. Immutable once built,
/// and serializable so it can cross a worker boundary as plain data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlRequest {
    /// Root directory results are reported relative to.
    pub root: PathBuf,

    /// Subtree below the root to crawl. Empty for the root itself.
    pub subtree: PathBuf,

    /// Maximum depth below the crawled subtree, `None` for unlimited.
    pub max_depth: Option<usize>,

    /// Root-level ignore rules, applied at every depth.
    pub rules: IgnoreRuleSet,

    /// Whether ignore rules (root-level and nested) are consulted at all.
    pub respect_ignore: bool,
}

/// Walks the requested subtree and returns root-relative file paths in
/// lexicographic order.
///
/// Hidden entries are treated like any other entry. Symlinks are reported
/// but never followed. Unreadable entries below the start directory are
/// logged and skipped; only an unreadable start directory is an error.
pub fn crawl(request: &CrawlRequest) -> Result<Vec<PathBuf>> {
    let start = request.root.join(&request.subtree);

    // Probe the start directory eagerly so a missing or unreadable root
    // surfaces as a distinct error instead of an empty listing.
    std::fs::read_dir(&start).map_err(|e| Error::root_unavailable(&start, e))?;

    let mut stack = IgnoreStack::new();
    if request.respect_ignore {
        // The request's rule set is anchored at the root and stays at the
        // bottom of the stack for the entire walk.
        let root_matcher = IgnoreMatcher::compile(request.rules.clone(), &request.root)?;
        stack.push(root_matcher, 0);

        // Ignore files in directories between the root and the crawled
        // subtree, including the start directory's own, still govern the
        // walk. The walker never visits those directories, so load them up
        // front. Depth 0 keeps them below every layer found during the walk.
        let mut dir = request.root.clone();
        for component in request.subtree.components() {
            dir.push(component);
            match load_nested_rules(&dir) {
                Ok(Some(matcher)) => stack.push(matcher, 0),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(
                        dir = %dir.display(),
                        "skipping unusable ignore file: {err}"
                    );
                }
            }
        }
    }

    let mut walker = walkdir::WalkDir::new(&start)
        .follow_links(false)
        .sort_by_file_name();
    if let Some(depth) = request.max_depth {
        walker = walker.max_depth(depth);
    }

    let mut files = Vec::new();
    let mut it = walker.into_iter();
    while let Some(entry) = it.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("skipping unreadable entry: {err}");
                continue;
            }
        };
        if entry.depth() == 0 {
            continue;
        }

        stack.pop_to(entry.depth());

        let Ok(rel) = entry.path().strip_prefix(&request.root) else {
            continue;
        };
        let is_dir = entry.file_type().is_dir();

        if request.respect_ignore && stack.is_ignored(entry.path(), is_dir) {
            if is_dir {
                // An ignored directory is pruned whole; nothing below it is
                // visited, so nested negations cannot resurrect its contents.
                it.skip_current_dir();
            }
            continue;
        }

        if is_dir {
            if request.respect_ignore {
                match load_nested_rules(entry.path()) {
                    Ok(Some(matcher)) => stack.push(matcher, entry.depth()),
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(
                            dir = %entry.path().display(),
                            "skipping unusable ignore file: {err}"
                        );
                    }
                }
            }
        } else {
            files.push(rel.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Reads and compiles the ignore file in a directory, if one exists.
fn load_nested_rules(dir: &Path) -> Result<Option<IgnoreMatcher>> {
    let path = dir.join(IGNORE_FILE_NAME);
    let source = match std::fs::read_to_string(&path) {
        Ok(source) => source,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    let rules = IgnoreRuleSet::parse(&source)?;
    Ok(Some(IgnoreMatcher::compile(rules, dir)?))
}

struct CrawlJob {
    request: CrawlRequest,
    cancel: CancellationToken,
    reply: oneshot::Sender<Result<Vec<PathBuf>>>,
}

/// Fixed-size pool of crawl workers.
///
/// Submissions beyond the pool's capacity queue on a bounded channel, so a
/// saturated pool delays new work rather than rejecting it. Workers live as
/// long as the pool; dropping the pool closes the channel and lets idle
/// workers exit.
#[derive(Debug)]
pub struct CrawlPool {
    jobs: async_channel::Sender<CrawlJob>,
}

impl std::fmt::Debug for CrawlJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrawlJob")
            .field("request", &self.request)
            .finish_non_exhaustive()
    }
}

impl CrawlPool {
    /// Spawns `workers` crawl workers (minimum one).
    pub fn new(workers: usize) -> Self {
        let workers = workers.max(1);
        let (tx, rx) = async_channel::bounded::<CrawlJob>(workers * 2);

        for _ in 0..workers {
            let rx = rx.clone();
            tokio::spawn(async move {
                while let Ok(job) = rx.recv().await {
                    if job.cancel.is_cancelled() {
                        let _ = job.reply.send(Err(Error::Cancelled));
                        continue;
                    }
                    let request = job.request;
                    let result =
                        match tokio::task::spawn_blocking(move || crawl(&request)).await {
                            Ok(result) => result,
                            Err(_) => Err(Error::WorkerGone),
                        };
                    let _ = job.reply.send(result);
                }
            });
        }

        Self { jobs: tx }
    }

    /// Submits a crawl and waits for its listing.
    ///
    /// Cancellation abandons the wait immediately; the worker notices the
    /// cancelled token before starting the walk if the job is still queued.
    pub async fn submit(
        &self,
        request: CrawlRequest,
        cancel: &CancellationToken,
    ) -> Result<Vec<PathBuf>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job = CrawlJob {
            request,
            cancel: cancel.clone(),
            reply: reply_tx,
        };
        self.jobs.send(job).await.map_err(|_| Error::WorkerGone)?;

        tokio::select! {
            () = cancel.cancelled() => Err(Error::Cancelled),
            result = reply_rx => result.map_err(|_| Error::WorkerGone)?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    fn request(root: &Path) -> CrawlRequest {
        CrawlRequest {
            root: root.to_path_buf(),
            subtree: PathBuf::new(),
            max_depth: None,
            rules: IgnoreRuleSet::default(),
            respect_ignore: true,
        }
    }

    fn paths(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn test_crawl_lists_sorted_relative_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.txt", "");
        write(dir.path(), "a.txt", "");
        write(dir.path(), "sub/c.txt", "");

        let files = crawl(&request(dir.path())).unwrap();
        assert_eq!(paths(&files), vec!["a.txt", "b.txt", "sub/c.txt"]);
    }

    #[test]
    fn test_crawl_includes_hidden_entries() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".env", "");
        write(dir.path(), ".config/settings.toml", "");

        let files = crawl(&request(dir.path())).unwrap();
        assert_eq!(paths(&files), vec![".config/settings.toml", ".env"]);
    }

    #[test]
    fn test_crawl_applies_root_rules_at_depth() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "keep.txt", "");
        write(dir.path(), "skip.log", "");
        write(dir.path(), "sub/deep.log", "");

        let mut req = request(dir.path());
        req.rules = IgnoreRuleSet::parse("*.log\n").unwrap();

        let files = crawl(&req).unwrap();
        assert_eq!(paths(&files), vec!["keep.txt"]);
    }

    #[test]
    fn test_crawl_prunes_ignored_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "src/main.rs", "");
        write(dir.path(), "target/debug/out.txt", "");

        let mut req = request(dir.path());
        req.rules = IgnoreRuleSet::parse("target/\n").unwrap();

        let files = crawl(&req).unwrap();
        assert_eq!(paths(&files), vec!["src/main.rs"]);
    }

    #[test]
    fn test_crawl_bypasses_rules_when_disabled() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), ".gitignore", "*.log\n");
        write(dir.path(), "skip.log", "");
        write(dir.path(), "keep.txt", "");

        let mut req = request(dir.path());
        req.rules = IgnoreRuleSet::parse("*.log\n").unwrap();
        req.respect_ignore = false;

        let files = crawl(&req).unwrap();
        assert_eq!(paths(&files), vec![".gitignore", "keep.txt", "skip.log"]);
    }

    #[test]
    fn test_crawl_nested_rules_and_negation() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "app.log", "");
        write(dir.path(), "sub/.gitignore", "!special.log\n");
        write(dir.path(), "sub/special.log", "");
        write(dir.path(), "sub/other.log", "");

        let mut req = request(dir.path());
        req.rules = IgnoreRuleSet::parse("*.log\n").unwrap();

        let files = crawl(&req).unwrap();
        // The nested negation un-ignores special.log only within sub/.
        assert_eq!(paths(&files), vec!["sub/.gitignore", "sub/special.log"]);
    }

    #[test]
    fn test_crawl_nested_rules_scoped_to_their_subtree() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a/.gitignore", "*.tmp\n");
        write(dir.path(), "a/skip.tmp", "");
        write(dir.path(), "b/keep.tmp", "");

        let files = crawl(&request(dir.path())).unwrap();
        assert_eq!(paths(&files), vec!["a/.gitignore", "b/keep.tmp"]);
    }

    #[test]
    fn test_crawl_respects_max_depth() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "top.txt", "");
        write(dir.path(), "sub/mid.txt", "");
        write(dir.path(), "sub/deeper/bottom.txt", "");

        let mut req = request(dir.path());
        req.max_depth = Some(1);

        let files = crawl(&req).unwrap();
        assert_eq!(paths(&files), vec!["top.txt"]);
    }

    #[test]
    fn test_crawl_of_subtree_reports_root_relative_paths() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "top.txt", "");
        write(dir.path(), "sub/inner.txt", "");

        let mut req = request(dir.path());
        req.subtree = PathBuf::from("sub");

        let files = crawl(&req).unwrap();
        assert_eq!(paths(&files), vec!["sub/inner.txt"]);
    }

    #[test]
    fn test_crawl_subtree_honors_its_own_ignore_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "sub/.gitignore", "app.log\n");
        write(dir.path(), "sub/app.log", "");
        write(dir.path(), "sub/keep.txt", "");

        let mut req = request(dir.path());
        req.subtree = PathBuf::from("sub");

        // The subtree-scoped crawl excludes the same files the full-root
        // crawl does.
        let files = crawl(&req).unwrap();
        assert_eq!(paths(&files), vec!["sub/.gitignore", "sub/keep.txt"]);

        let full = crawl(&request(dir.path())).unwrap();
        assert_eq!(paths(&full), paths(&files));
    }

    #[test]
    fn test_crawl_subtree_honors_intermediate_ignore_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a/.gitignore", "*.log\n");
        write(dir.path(), "a/b/skip.log", "");
        write(dir.path(), "a/b/keep.txt", "");

        let mut req = request(dir.path());
        req.subtree = PathBuf::from("a/b");

        let files = crawl(&req).unwrap();
        assert_eq!(paths(&files), vec!["a/b/keep.txt"]);
    }

    #[test]
    fn test_crawl_missing_root_errors() {
        let dir = TempDir::new().unwrap();
        let mut req = request(dir.path());
        req.subtree = PathBuf::from("does-not-exist");

        let err = crawl(&req).unwrap_err();
        assert!(matches!(err, Error::RootUnavailable { .. }));
    }

    #[test]
    fn test_crawl_request_serde_round_trip() {
        let req = CrawlRequest {
            root: PathBuf::from("/project"),
            subtree: PathBuf::from("src"),
            max_depth: Some(4),
            rules: IgnoreRuleSet::parse("*.log\n!keep.log\n").unwrap(),
            respect_ignore: true,
        };

        let encoded = serde_json::to_string(&req).unwrap();
        let decoded: CrawlRequest = serde_json::from_str(&encoded).unwrap();

        assert_eq!(decoded.root, req.root);
        assert_eq!(decoded.subtree, req.subtree);
        assert_eq!(decoded.max_depth, req.max_depth);
        assert_eq!(decoded.rules, req.rules);
        assert!(decoded.respect_ignore);
    }

    #[tokio::test]
    async fn test_pool_submit_returns_listing() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", "");
        write(dir.path(), "b.txt", "");

        let pool = CrawlPool::new(2);
        let cancel = CancellationToken::new();

        let files = pool.submit(request(dir.path()), &cancel).await.unwrap();
        assert_eq!(paths(&files), vec!["a.txt", "b.txt"]);
    }

    #[tokio::test]
    async fn test_pool_runs_concurrent_submissions() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "x.txt", "");

        let pool = std::sync::Arc::new(CrawlPool::new(2));
        let cancel = CancellationToken::new();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let pool = pool.clone();
            let cancel = cancel.clone();
            let req = request(dir.path());
            handles.push(tokio::spawn(
                async move { pool.submit(req, &cancel).await },
            ));
        }
        for handle in handles {
            let files = handle.await.unwrap().unwrap();
            assert_eq!(paths(&files), vec!["x.txt"]);
        }
    }

    #[tokio::test]
    async fn test_pool_submit_cancelled_token() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.txt", "");

        let pool = CrawlPool::new(1);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = pool.submit(request(dir.path()), &cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }
}
