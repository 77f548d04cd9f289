//! YtDlpExtractor: the extraction collaborator, powered by yt-dlp.
//!
//! Metadata comes from `yt-dlp --dump-json`, bytes from `yt-dlp -f <format_id>`.
//! Identity hints (cookies file, user agent) are passed through untouched.

use crate::core::config;
use crate::core::error::AppError;
use crate::core::process::{run_with_timeout, stderr_tail};
use crate::download::source::{MediaExtractor, RawMediaInfo};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use url::Url;

/// Extraction backend that shells out to yt-dlp.
pub struct YtDlpExtractor {
    bin: String,
    cookies_file: Option<String>,
    user_agent: Option<String>,
    resolve_timeout: Duration,
    fetch_timeout: Duration,
}

impl Default for YtDlpExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl YtDlpExtractor {
    /// Backend configured from the environment (`YTDL_BIN`, `YTDL_COOKIES_FILE`, `YTDL_USER_AGENT`)
    pub fn new() -> Self {
        Self {
            bin: config::YTDL_BIN.clone(),
            cookies_file: config::YTDL_COOKIES_FILE.clone(),
            user_agent: config::YTDL_USER_AGENT.clone(),
            resolve_timeout: config::download::resolve_timeout(),
            fetch_timeout: config::download::fetch_timeout(),
        }
    }

    pub fn with_bin(mut self, bin: impl Into<String>) -> Self {
        self.bin = bin.into();
        self
    }

    /// Arguments shared by every invocation
    fn base_args(&self) -> Vec<String> {
        let mut args = vec!["--no-playlist".to_string(), "--no-warnings".to_string()];
        if let Some(cookies) = &self.cookies_file {
            args.push("--cookies".to_string());
            args.push(shellexpand::tilde(cookies).to_string());
        }
        if let Some(user_agent) = &self.user_agent {
            args.push("--user-agent".to_string());
            args.push(user_agent.clone());
        }
        args
    }

    fn resolve_args(&self, url: &Url) -> Vec<String> {
        let mut args = self.base_args();
        args.push("--dump-json".to_string());
        args.push(url.to_string());
        args
    }

    fn fetch_args(&self, url: &Url, format_id: &str, dest_dir: &Path) -> Vec<String> {
        let template = dest_dir.join("%(id)s.%(ext)s");
        let mut args = self.base_args();
        args.extend([
            "--format".to_string(),
            format_id.to_string(),
            "--merge-output-format".to_string(),
            "mp4".to_string(),
            "--no-part".to_string(),
            "--output".to_string(),
            template.to_string_lossy().to_string(),
            "--print".to_string(),
            "after_move:filepath".to_string(),
            url.to_string(),
        ]);
        args
    }
}

/// The last non-empty stdout line of `--print after_move:filepath` is the final file.
fn parse_printed_path(stdout: &str) -> Option<PathBuf> {
    stdout
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(PathBuf::from)
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    async fn resolve(&self, url: &Url) -> Result<RawMediaInfo, AppError> {
        let args = self.resolve_args(url);
        log::debug!("yt-dlp command for resolve: {} {}", self.bin, args.join(" "));

        let output = run_with_timeout(Command::new(&self.bin).args(&args), self.resolve_timeout).await?;
        if !output.status.success() {
            return Err(AppError::Download(format!(
                "yt-dlp --dump-json failed: {}",
                stderr_tail(&output)
            )));
        }

        // --no-playlist still prints one JSON document per line for some extractors
        let stdout = String::from_utf8_lossy(&output.stdout);
        let first = stdout
            .lines()
            .find(|line| line.trim_start().starts_with('{'))
            .ok_or_else(|| AppError::Download("yt-dlp produced no JSON".to_string()))?;

        let info: RawMediaInfo = serde_json::from_str(first)?;
        log::info!(
            "yt-dlp resolved {}: {} formats, duration {:?}",
            url,
            info.formats.len(),
            info.duration
        );
        Ok(info)
    }

    async fn fetch(&self, url: &Url, format_id: &str, dest_dir: &Path) -> Result<PathBuf, AppError> {
        let args = self.fetch_args(url, format_id, dest_dir);
        log::info!("Downloading {} (format {}) into {}", url, format_id, dest_dir.display());

        let output = run_with_timeout(Command::new(&self.bin).args(&args), self.fetch_timeout).await?;
        if !output.status.success() {
            return Err(AppError::Download(format!(
                "yt-dlp download failed: {}",
                stderr_tail(&output)
            )));
        }

        let path = parse_printed_path(&String::from_utf8_lossy(&output.stdout))
            .ok_or_else(|| AppError::Download("yt-dlp did not report the output file".to_string()))?;

        if !path.starts_with(dest_dir) {
            return Err(AppError::Download(format!(
                "yt-dlp wrote outside the working directory: {}",
                path.display()
            )));
        }
        if !tokio::fs::try_exists(&path).await? {
            return Err(AppError::Download(format!("Downloaded file not found: {}", path.display())));
        }

        Ok(path)
    }
}
