//! Shell-command summarizer.
//!
//! The command runs through `sh -c` with the mode as `$1` and in
//! `PRECIS_MODE`. The text to digest is written to its stdin and the digest
//! is read from its stdout. Exit statuses follow `sysexits.h`:
//!
//! | status | classification        |
//! |--------|-----------------------|
//! | 0      | success               |
//! | 69     | network (unavailable) |
//! | 75     | rate limited          |
//! | 77     | auth                  |
//! | other  | provider              |

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use precis_core::{Transform, TransformError};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

const EX_UNAVAILABLE: i32 = 69;
const EX_TEMPFAIL: i32 = 75;
const EX_NOPERM: i32 = 77;

pub struct CommandTransform {
    command: String,
    timeout: Duration,
}

impl CommandTransform {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self { command: command.into(), timeout }
    }

    async fn run(&self, text: &str, mode: &str) -> Result<String, TransformError> {
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .arg("precis")
            .arg(mode)
            .env("PRECIS_MODE", mode)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TransformError::Provider(format!("failed to start `{}`: {}", self.command, e)))?;

        let writer = child.stdin.take().map(|mut stdin| {
            let input = text.to_string();
            tokio::spawn(async move {
                match stdin.write_all(input.as_bytes()).await {
                    Err(e) if e.kind() != ErrorKind::BrokenPipe => Err(e),
                    _ => Ok(()),
                }
            })
        });

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| TransformError::Network(format!("no answer after {}s", self.timeout.as_secs())))?
            .map_err(|e| TransformError::Provider(format!("failed to wait for `{}`: {}", self.command, e)))?;

        if let Some(writer) = writer
            && let Ok(Err(e)) = writer.await
        {
            return Err(TransformError::Provider(format!("failed to write input: {}", e)));
        }

        debug!(status = ?output.status, bytes = output.stdout.len(), "transform command finished");

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let detail = if stderr.is_empty() { format!("`{}` exited with {}", self.command, output.status) } else { stderr };
            return Err(classify_exit(output.status.code(), detail));
        }

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if stdout.trim().is_empty() {
            return Err(TransformError::IncompleteResponse("the command produced no output".to_string()));
        }
        Ok(stdout)
    }
}

fn classify_exit(code: Option<i32>, detail: String) -> TransformError {
    match code {
        Some(EX_UNAVAILABLE) => TransformError::Network(detail),
        Some(EX_TEMPFAIL) => TransformError::RateLimited { retry_after: None },
        Some(EX_NOPERM) => TransformError::Auth(detail),
        _ => TransformError::Provider(detail),
    }
}

impl Transform for CommandTransform {
    async fn transform(&self, text: &str, mode: &str) -> Result<String, TransformError> {
        self.run(text, mode).await
    }
}
