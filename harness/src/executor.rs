use anyhow::Context;
use async_trait::async_trait;
use log::trace;
#[cfg(test)]
use mockall::{automock, predicate::*};
use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Captured result of one dispatched script run. Standard output and
/// standard error stay separate so the transport layer decides how to
/// combine them.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScriptOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<i32>,
}

/// ScriptExecutor runs an executable with a request-scoped environment and
/// standard input, collecting its complete output.
///
/// An implementation of a script executor owns the entire lifetime of one
/// subprocess; nothing is shared between concurrent runs.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    async fn run(
        &self,
        script: &Path,
        env: HashMap<String, String>,
        stdin: Vec<u8>,
    ) -> Result<ScriptOutput, anyhow::Error>;
}

/// Spawns the script as a child process, inheriting the server's
/// environment plus the request-scoped variables.
pub struct ProcessScriptExecutor {
    timeout: Duration,
}

impl ProcessScriptExecutor {
    pub fn new(timeout: Duration) -> Self {
        ProcessScriptExecutor { timeout }
    }
}

#[async_trait]
impl ScriptExecutor for ProcessScriptExecutor {
    async fn run(
        &self,
        script: &Path,
        env: HashMap<String, String>,
        stdin: Vec<u8>,
    ) -> Result<ScriptOutput, anyhow::Error> {
        trace!("run - spawning {}", script.display());
        let mut child = Command::new(script)
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {}", script.display()))?;

        // Feed stdin from a separate task so a script that writes before
        // reading cannot deadlock against a full pipe.
        let mut child_stdin = child
            .stdin
            .take()
            .context("child process has no stdin handle")?;
        let writer = tokio::spawn(async move {
            if !stdin.is_empty() {
                child_stdin.write_all(&stdin).await?;
            }
            child_stdin.shutdown().await
        });

        // A timed-out wait drops the child, which kills the script.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                anyhow::format_err!(
                    "script {} did not finish within {:?}",
                    script.display(),
                    self.timeout
                )
            })?
            .with_context(|| format!("failed collecting output of {}", script.display()))?;
        let _ = writer.await;

        trace!(
            "run - {} finished with status {:?}",
            script.display(),
            output.status.code()
        );
        Ok(ScriptOutput {
            stdout: output.stdout,
            stderr: output.stderr,
            exit_code: output.status.code(),
        })
    }
}
