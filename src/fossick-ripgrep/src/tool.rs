//! The ripgrep-backed collaborator and its capability traits.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use crate::error::{MatcherError, MatcherResult};
use crate::invocation::{EnumerateRequest, LineMatchRequest};

/// Buffered output of one content-match invocation.
#[derive(Debug, Clone, Default)]
pub struct MatcherOutput {
    /// One raw event line per entry, in stream order. Decoding and
    /// malformed-event isolation are the consumer's responsibility.
    pub raw_events: Vec<String>,
}

/// Enumerates paths under a directory.
#[async_trait]
pub trait PathEnumerator: Send + Sync {
    /// Lists files under the request's directory, returning paths relative
    /// to it.
    async fn enumerate(
        &self,
        request: &EnumerateRequest,
        cancel: &CancellationToken,
    ) -> MatcherResult<Vec<PathBuf>>;
}

/// Matches a pattern against file contents, line by line.
#[async_trait]
pub trait LineMatcher: Send + Sync {
    /// Runs a content-pattern match and returns the buffered event stream.
    async fn match_lines(
        &self,
        request: &LineMatchRequest,
        cancel: &CancellationToken,
    ) -> MatcherResult<MatcherOutput>;
}

/// Ripgrep executable wrapper implementing both capability traits.
#[derive(Debug, Clone)]
pub struct RipgrepTool {
    program: PathBuf,
}

impl RipgrepTool {
    /// Wraps a specific executable path.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Locates `rg` on the search path.
    pub fn locate() -> MatcherResult<Self> {
        let program = which::which("rg").map_err(|e| {
            MatcherError::spawn(
                "rg",
                std::io::Error::new(std::io::ErrorKind::NotFound, e.to_string()),
            )
        })?;
        Ok(Self::new(program))
    }

    /// Returns the executable path this tool invokes.
    pub fn program(&self) -> &Path {
        &self.program
    }
}

#[async_trait]
impl PathEnumerator for RipgrepTool {
    async fn enumerate(
        &self,
        request: &EnumerateRequest,
        cancel: &CancellationToken,
    ) -> MatcherResult<Vec<PathBuf>> {
        let cmd = request.to_command(&self.program);
        let stdout = run_buffered(cmd, &self.program, cancel).await?;
        Ok(stdout
            .lines()
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect())
    }
}

#[async_trait]
impl LineMatcher for RipgrepTool {
    async fn match_lines(
        &self,
        request: &LineMatchRequest,
        cancel: &CancellationToken,
    ) -> MatcherResult<MatcherOutput> {
        let cmd = request.to_command(&self.program);
        let stdout = run_buffered(cmd, &self.program, cancel).await?;
        Ok(MatcherOutput {
            raw_events: stdout.lines().map(str::to_owned).collect(),
        })
    }
}

/// Runs a command to completion with buffered output.
///
/// Exit code 0 and 1 both yield stdout (1 simply means zero results); any
/// other code fails with the captured stderr. Cancellation kills the child
/// via `kill_on_drop` and resolves to [`MatcherError::Cancelled`], never a
/// fabricated empty success.
pub(crate) async fn run_buffered(
    mut cmd: Command,
    program: &Path,
    cancel: &CancellationToken,
) -> MatcherResult<String> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd
        .spawn()
        .map_err(|e| MatcherError::spawn(program, e))?;

    let output = tokio::select! {
        () = cancel.cancelled() => {
            // Dropping the wait future drops the child, which kills it.
            tracing::debug!(program = %program.display(), "matcher invocation cancelled");
            return Err(MatcherError::Cancelled);
        }
        output = child.wait_with_output() => output?,
    };

    match output.status.code() {
        Some(0) | Some(1) => Ok(String::from_utf8_lossy(&output.stdout).into_owned()),
        code => Err(MatcherError::process_exit(
            code.unwrap_or(-1),
            String::from_utf8_lossy(&output.stderr).into_owned(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[tokio::test]
    async fn test_run_buffered_success() {
        let cancel = CancellationToken::new();
        let stdout = run_buffered(sh("printf 'a\\nb\\n'"), Path::new("sh"), &cancel)
            .await
            .unwrap();
        assert_eq!(stdout, "a\nb\n");
    }

    #[tokio::test]
    async fn test_run_buffered_exit_one_is_empty_success() {
        let cancel = CancellationToken::new();
        let stdout = run_buffered(sh("exit 1"), Path::new("sh"), &cancel)
            .await
            .unwrap();
        assert!(stdout.is_empty());
    }

    #[tokio::test]
    async fn test_run_buffered_exit_code_error_carries_stderr() {
        let cancel = CancellationToken::new();
        let err = run_buffered(
            sh("echo 'regex parse error' >&2; exit 2"),
            Path::new("sh"),
            &cancel,
        )
        .await
        .unwrap_err();

        match err {
            MatcherError::ProcessExit { code, stderr } => {
                assert_eq!(code, 2);
                assert!(stderr.contains("regex parse error"));
            }
            other => panic!("expected ProcessExit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_run_buffered_spawn_failure() {
        let cancel = CancellationToken::new();
        let missing = Path::new("/nonexistent/definitely-not-a-binary");
        let err = run_buffered(Command::new(missing), missing, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, MatcherError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_run_buffered_cancellation() {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            token.cancel();
        });

        let err = run_buffered(sh("sleep 10"), Path::new("sh"), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }

    #[tokio::test]
    async fn test_run_buffered_respects_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "x").unwrap();
        std::fs::write(dir.path().join("b.txt"), "y").unwrap();

        let mut cmd = sh("ls -1");
        cmd.current_dir(dir.path());
        let cancel = CancellationToken::new();
        let stdout = run_buffered(cmd, Path::new("sh"), &cancel).await.unwrap();

        let mut names: Vec<&str> = stdout.lines().collect();
        names.sort_unstable();
        assert_eq!(names, vec!["a.txt", "b.txt"]);
    }
}
