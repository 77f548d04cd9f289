//! Collaborator abstraction layer.
//!
//! The pipeline never shells out directly. It talks to two black boxes:
//! - `MediaExtractor`: resolves a URL into format descriptors and fetches bytes
//! - `MediaSegmenter`: probes duration and cuts a file into time slices
//!
//! Built-in backends:
//! - `YtDlpExtractor`: 1000+ sites via yt-dlp
//! - `FfmpegSegmenter`: ffprobe + ffmpeg stream-copy segmenting

pub mod ffmpeg;
pub mod ytdlp;

use crate::core::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use url::Url;

pub use ffmpeg::FfmpegSegmenter;
pub use ytdlp::YtDlpExtractor;

/// One format descriptor as reported by the extractor (`yt-dlp --dump-json` shape).
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawFormat {
    pub format_id: String,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub format_note: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub height: Option<u64>,
    #[serde(default)]
    pub abr: Option<f64>,
    #[serde(default)]
    pub tbr: Option<f64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub filesize: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub filesize_approx: Option<u64>,
}

/// yt-dlp reports some integer fields as floats depending on the extractor.
fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<f64> = Option::deserialize(deserializer)?;
    Ok(value.filter(|n| n.is_finite() && *n >= 0.0).map(|n| n as u64))
}

/// Everything the extractor knows about a URL before downloading.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct RawMediaInfo {
    #[serde(default)]
    pub title: Option<String>,
    /// Seconds; fractional for most sites, absent for some
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

/// Extraction collaborator.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Human-readable name of this backend (e.g., "yt-dlp")
    fn name(&self) -> &str;

    /// Resolve the URL into its duration and format descriptors, without downloading.
    async fn resolve(&self, url: &Url) -> Result<RawMediaInfo, AppError>;

    /// Download `format_id` of `url` into `dest_dir`, returning the produced file.
    async fn fetch(&self, url: &Url, format_id: &str, dest_dir: &Path) -> Result<PathBuf, AppError>;
}

/// Segmentation collaborator.
#[async_trait]
pub trait MediaSegmenter: Send + Sync {
    /// Total duration of the media file in seconds
    async fn probe(&self, path: &Path) -> Result<f64, AppError>;

    /// Cut `path` into `slice_secs` long pieces inside `out_dir` without re-encoding.
    ///
    /// Output names carry a zero-padded positional suffix, so lexical order is time order.
    async fn segment(&self, path: &Path, slice_secs: u64, out_dir: &Path) -> Result<Vec<PathBuf>, AppError>;
}
