//! FfmpegSegmenter: the segmentation collaborator.
//!
//! Duration comes from ffprobe; slicing uses ffmpeg's segment muxer with stream copy,
//! so splitting is fast and lossless.

use crate::core::config;
use crate::core::error::AppError;
use crate::core::process::{run_with_timeout, stderr_tail, FFMPEG_TIMEOUT, FFPROBE_TIMEOUT};
use crate::download::source::MediaSegmenter;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Output name prefix of every slice (`part_000.mp4`, `part_001.mp4`, ...)
pub const PART_PREFIX: &str = "part_";

pub struct FfmpegSegmenter {
    ffmpeg_bin: String,
    ffprobe_bin: String,
}

impl Default for FfmpegSegmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegSegmenter {
    pub fn new() -> Self {
        Self {
            ffmpeg_bin: config::FFMPEG_BIN.clone(),
            ffprobe_bin: config::FFPROBE_BIN.clone(),
        }
    }

    fn segment_args(path: &Path, slice_secs: u64, out_dir: &Path) -> Vec<String> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("mp4");
        let pattern = out_dir.join(format!("{}%03d.{}", PART_PREFIX, ext));
        vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-i".to_string(),
            path.to_string_lossy().to_string(),
            "-map".to_string(),
            "0".to_string(),
            "-c".to_string(),
            "copy".to_string(),
            "-f".to_string(),
            "segment".to_string(),
            "-segment_time".to_string(),
            slice_secs.to_string(),
            "-reset_timestamps".to_string(),
            "1".to_string(),
            pattern.to_string_lossy().to_string(),
        ]
    }
}

fn parse_duration(stdout: &str) -> Option<f64> {
    stdout
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|secs| secs.is_finite() && *secs > 0.0)
}

#[async_trait]
impl MediaSegmenter for FfmpegSegmenter {
    async fn probe(&self, path: &Path) -> Result<f64, AppError> {
        let output = run_with_timeout(
            Command::new(&self.ffprobe_bin)
                .args([
                    "-v",
                    "error",
                    "-show_entries",
                    "format=duration",
                    "-of",
                    "default=noprint_wrappers=1:nokey=1",
                ])
                .arg(path),
            FFPROBE_TIMEOUT,
        )
        .await?;

        if !output.status.success() {
            return Err(AppError::Ffmpeg(format!("ffprobe failed: {}", stderr_tail(&output))));
        }

        parse_duration(&String::from_utf8_lossy(&output.stdout))
            .ok_or_else(|| AppError::Ffmpeg(format!("ffprobe reported no duration for {}", path.display())))
    }

    async fn segment(&self, path: &Path, slice_secs: u64, out_dir: &Path) -> Result<Vec<PathBuf>, AppError> {
        let args = Self::segment_args(path, slice_secs, out_dir);
        log::debug!("ffmpeg command for split: {} {}", self.ffmpeg_bin, args.join(" "));

        let output = run_with_timeout(Command::new(&self.ffmpeg_bin).args(&args), FFMPEG_TIMEOUT).await?;
        if !output.status.success() {
            return Err(AppError::Ffmpeg(format!("ffmpeg split failed: {}", stderr_tail(&output))));
        }

        let mut parts = Vec::new();
        let mut entries = fs_err::tokio::read_dir(out_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with(PART_PREFIX) {
                parts.push(entry.path());
            }
        }
        parts.sort();

        Ok(parts)
    }
}
