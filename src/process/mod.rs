// dbbackup/src/process/mod.rs
//! Child process supervision for the native dump/restore tools.
//!
//! The runner spawns exactly one child per call, forwards its stdout and
//! stderr line by line as they arrive, and resolves to a [`ProcessOutcome`]
//! once the child terminates. A binary that cannot be started at all is
//! reported as a spawn error, distinct from a nonzero exit.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::task::JoinHandle;

use crate::errors::{BackupError, Result};

/// A fully-described command line: program, arguments and the environment
/// overrides scoped to this single child. The parent environment is
/// inherited but never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    /// Short program name for log prefixes (the program field may be a path).
    fn display_name(&self) -> String {
        Path::new(&self.program)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.clone())
    }
}

/// Result of one supervised child process. Produced exactly once per
/// [`ProcessRunner::run`] call.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    /// Exit code; `None` when the child was terminated by a signal.
    pub exit_code: Option<i32>,
    pub stdout_lines: Vec<String>,
    pub stderr_lines: Vec<String>,
    /// Set when the child could never be started (binary missing,
    /// permission denied). Unconditionally fatal for the operation.
    pub spawn_error: Option<String>,
}

impl ProcessOutcome {
    pub fn success(&self) -> bool {
        self.spawn_error.is_none() && self.exit_code == Some(0)
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, spec: &CommandSpec) -> ProcessOutcome;
}

/// Production runner backed by `tokio::process`.
pub struct TokioProcessRunner;

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> ProcessOutcome {
        let name = spec.display_name();
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &spec.envs {
            command.env(key, value);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                return ProcessOutcome {
                    exit_code: None,
                    stdout_lines: Vec::new(),
                    stderr_lines: Vec::new(),
                    spawn_error: Some(err.to_string()),
                };
            }
        };

        let stdout_task = stream_lines(child.stdout.take(), name.clone(), false);
        let stderr_task = stream_lines(child.stderr.take(), name.clone(), true);

        let status = child.wait().await;
        let stdout_lines = stdout_task.await.unwrap_or_default();
        let stderr_lines = stderr_task.await.unwrap_or_default();

        match status {
            Ok(status) => ProcessOutcome {
                exit_code: status.code(),
                stdout_lines,
                stderr_lines,
                spawn_error: None,
            },
            Err(err) => ProcessOutcome {
                exit_code: None,
                stdout_lines,
                stderr_lines,
                spawn_error: Some(format!("failed to wait on child: {err}")),
            },
        }
    }
}

/// Forwards each line to the console the moment it is produced and collects
/// the ordered sequence for the caller. Line-at-a-time forwarding keeps
/// memory bounded by what the caller chooses to retain.
fn stream_lines<R>(reader: Option<R>, name: String, is_stderr: bool) -> JoinHandle<Vec<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut collected = Vec::new();
        let Some(reader) = reader else {
            return collected;
        };
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if is_stderr {
                        eprintln!("  [{name}] {line}");
                    } else {
                        println!("  [{name}] {line}");
                    }
                    collected.push(line);
                }
                Ok(None) => break,
                Err(err) => {
                    eprintln!("⚠ [{name}] output stream closed early: {err}");
                    break;
                }
            }
        }
        collected
    })
}

/// Maps a finished outcome onto the error taxonomy: spawn failures and
/// nonzero exits are fatal, with the captured stderr as the diagnostic
/// payload. The runner itself never retries.
pub fn ensure_success(program: &str, outcome: &ProcessOutcome) -> Result<()> {
    if let Some(detail) = &outcome.spawn_error {
        return Err(BackupError::Spawn {
            program: program.to_string(),
            detail: detail.clone(),
        });
    }
    match outcome.exit_code {
        Some(0) => Ok(()),
        code => Err(BackupError::Process {
            program: program.to_string(),
            code,
            stderr: outcome.stderr_lines.join("\n"),
        }),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let outcome = TokioProcessRunner
            .run(&CommandSpec::new("echo").arg("hello backup"))
            .await;
        assert!(outcome.success());
        assert_eq!(outcome.stdout_lines, vec!["hello backup".to_string()]);
        assert!(outcome.stderr_lines.is_empty());
    }

    #[tokio::test]
    async fn missing_binary_reports_spawn_error() {
        let outcome = TokioProcessRunner
            .run(&CommandSpec::new("definitely-not-a-real-dump-tool"))
            .await;
        assert!(outcome.spawn_error.is_some());
        assert!(!outcome.success());
        match ensure_success("definitely-not-a-real-dump-tool", &outcome) {
            Err(BackupError::Spawn { program, .. }) => {
                assert_eq!(program, "definitely-not-a-real-dump-tool");
            }
            other => panic!("expected Spawn error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn nonzero_exit_carries_stderr() {
        let outcome = TokioProcessRunner
            .run(&CommandSpec::new("sh").args(["-c", "echo boom >&2; exit 3"]))
            .await;
        assert_eq!(outcome.exit_code, Some(3));
        assert_eq!(outcome.stderr_lines, vec!["boom".to_string()]);
        match ensure_success("sh", &outcome) {
            Err(BackupError::Process { code, stderr, .. }) => {
                assert_eq!(code, Some(3));
                assert!(stderr.contains("boom"));
            }
            other => panic!("expected Process error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn scoped_env_reaches_the_child_only() {
        let outcome = TokioProcessRunner
            .run(
                &CommandSpec::new("sh")
                    .args(["-c", "printf '%s' \"$DBBACKUP_PROBE\""])
                    .env("DBBACKUP_PROBE", "visible"),
            )
            .await;
        assert!(outcome.success());
        assert_eq!(outcome.stdout_lines, vec!["visible".to_string()]);
        assert!(std::env::var("DBBACKUP_PROBE").is_err());
    }
}
