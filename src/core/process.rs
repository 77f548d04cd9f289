//! Process execution utilities with timeout support
//!
//! Provides helpers for running external processes (ffmpeg, ffprobe, yt-dlp)
//! with configurable timeouts to prevent hung processes from blocking a session.

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

use crate::core::error::AppError;

/// Default timeout for ffmpeg segmenting (10 minutes, stream copy of a 2h file)
pub const FFMPEG_TIMEOUT: Duration = Duration::from_secs(600);

/// Default timeout for ffprobe metadata queries (30 seconds)
pub const FFPROBE_TIMEOUT: Duration = Duration::from_secs(30);

/// Run an async Command with a timeout.
///
/// The child is killed when the timeout elapses (`kill_on_drop`).
/// Returns the process Output on success, or an AppError on timeout/IO failure.
pub async fn run_with_timeout(cmd: &mut Command, timeout: Duration) -> Result<Output, AppError> {
    cmd.kill_on_drop(true);
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => Err(AppError::Io(e)),
        Err(_) => Err(AppError::Timeout(timeout.as_secs())),
    }
}

/// Last non-empty stderr line, trimmed. Used for log lines, never for user messages.
pub fn stderr_tail(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr)
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .map(|line| line.trim().to_string())
        .unwrap_or_else(|| format!("exit status {}", output.status))
}

/// Returns the first line of `<bin> <version_arg>` or None if the binary can't run.
pub async fn tool_version(bin: &str, version_arg: &str) -> Option<String> {
    let output = run_with_timeout(Command::new(bin).arg(version_arg), Duration::from_secs(10))
        .await
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|line| line.trim().to_string())
}
