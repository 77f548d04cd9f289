//! Fake collaborators for pipeline and selection tests
//!
//! None of them touch the network or spawn processes. Files they "produce" are real
//! (sparse) files, so cleanup can be asserted on the filesystem.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use teloxide::types::{ChatId, MessageId};
use url::Url;

use clipferry::core::config::Limits;
use clipferry::core::error::AppError;
use clipferry::download::formats::PresentedChoice;
use clipferry::download::source::{MediaExtractor, MediaSegmenter, RawFormat, RawMediaInfo};
use clipferry::download::transport::{ChatTransport, PromptId};

pub const MB: u64 = 1024 * 1024;

/// Limits with a private temp root and the stock thresholds
pub fn test_limits(temp_root: &Path) -> Limits {
    Limits {
        temp_root: temp_root.to_path_buf(),
        selection_timeout: Duration::from_secs(30),
        ..Limits::default()
    }
}

/// True when no run directory is left under `root`
pub fn workspace_is_clean(root: &Path) -> bool {
    match std::fs::read_dir(root) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}

pub fn video_format(id: &str, height: u64, size: u64) -> RawFormat {
    RawFormat {
        format_id: id.to_string(),
        ext: Some("mp4".to_string()),
        vcodec: Some("avc1.64001F".to_string()),
        acodec: Some("mp4a.40.2".to_string()),
        format_note: Some(format!("{}p", height)),
        height: Some(height),
        filesize: Some(size),
        ..Default::default()
    }
}

/// Three muxed mp4 formats (720p, 480p, 360p)
pub fn sample_info(duration: f64) -> RawMediaInfo {
    RawMediaInfo {
        title: Some("Test clip".to_string()),
        duration: Some(duration),
        formats: vec![
            video_format("22", 720, 20 * MB),
            video_format("59", 480, 12 * MB),
            video_format("18", 360, 8 * MB),
        ],
    }
}

/// Scripted extractor.
///
/// `resolve` pops scripted results in order (the last one repeats); `fetch` writes a
/// sparse file of `fetch_size` bytes, or fails when `fetch_error` is set. URLs whose host
/// matches `slow_host` take `slow_delay` to resolve.
pub struct FakeExtractor {
    resolve_results: Mutex<VecDeque<Result<RawMediaInfo, String>>>,
    pub resolve_calls: Mutex<Vec<Url>>,
    pub fetch_calls: Mutex<Vec<String>>,
    fetch_size: u64,
    fetch_error: Option<String>,
    slow_host: Option<String>,
    slow_delay: Duration,
}

impl FakeExtractor {
    pub fn new(info: RawMediaInfo, fetch_size: u64) -> Self {
        Self::scripted(vec![Ok(info)], fetch_size)
    }

    pub fn scripted(results: Vec<Result<RawMediaInfo, String>>, fetch_size: u64) -> Self {
        Self {
            resolve_results: Mutex::new(results.into()),
            resolve_calls: Mutex::new(Vec::new()),
            fetch_calls: Mutex::new(Vec::new()),
            fetch_size,
            fetch_error: None,
            slow_host: None,
            slow_delay: Duration::ZERO,
        }
    }

    pub fn slow_resolve(mut self, host: &str, delay: Duration) -> Self {
        self.slow_host = Some(host.to_string());
        self.slow_delay = delay;
        self
    }

    pub fn failing_fetch(mut self, error: &str) -> Self {
        self.fetch_error = Some(error.to_string());
        self
    }

    pub fn fetched_formats(&self) -> Vec<String> {
        self.fetch_calls.lock().unwrap().clone()
    }

    pub fn resolved_urls(&self) -> Vec<String> {
        self.resolve_calls
            .lock()
            .unwrap()
            .iter()
            .map(|u| u.to_string())
            .collect()
    }
}

#[async_trait]
impl MediaExtractor for FakeExtractor {
    fn name(&self) -> &str {
        "fake"
    }

    async fn resolve(&self, url: &Url) -> Result<RawMediaInfo, AppError> {
        self.resolve_calls.lock().unwrap().push(url.clone());
        if self.slow_host.as_deref().is_some_and(|host| url.host_str() == Some(host)) {
            tokio::time::sleep(self.slow_delay).await;
        }
        let mut results = self.resolve_results.lock().unwrap();
        let next = if results.len() > 1 {
            results.pop_front()
        } else {
            results.front().cloned()
        };
        next.unwrap_or_else(|| Err("no scripted result".to_string()))
            .map_err(AppError::Download)
    }

    async fn fetch(&self, _url: &Url, format_id: &str, dest_dir: &Path) -> Result<PathBuf, AppError> {
        self.fetch_calls.lock().unwrap().push(format_id.to_string());
        if let Some(error) = &self.fetch_error {
            return Err(AppError::Download(error.clone()));
        }
        let path = dest_dir.join(format!("clip-{}.mp4", format_id));
        let file = std::fs::File::create(&path)?;
        file.set_len(self.fetch_size)?;
        Ok(path)
    }
}

/// Segmenter that writes `parts` small slices, or fails
pub struct FakeSegmenter {
    duration: f64,
    parts: usize,
    fail: bool,
}

impl FakeSegmenter {
    pub fn new(duration: f64, parts: usize) -> Self {
        Self {
            duration,
            parts,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            duration: 900.0,
            parts: 0,
            fail: true,
        }
    }
}

#[async_trait]
impl MediaSegmenter for FakeSegmenter {
    async fn probe(&self, _path: &Path) -> Result<f64, AppError> {
        Ok(self.duration)
    }

    async fn segment(&self, _path: &Path, _slice_secs: u64, out_dir: &Path) -> Result<Vec<PathBuf>, AppError> {
        if self.fail {
            return Err(AppError::Ffmpeg("Invalid data found when processing input".to_string()));
        }
        let mut files = Vec::new();
        for i in 0..self.parts {
            let path = out_dir.join(format!("part_{:03}.mp4", i));
            let file = std::fs::File::create(&path)?;
            file.set_len(30 * MB)?;
            files.push(path);
        }
        Ok(files)
    }
}

/// Everything the transport was asked to do, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Text(String),
    Prompt { labels: Vec<String>, generation: u64 },
    Edit(String),
    File { name: String, caption: String },
}

/// Records calls; file sends fail from the `fail_file_at`-th (1-based) send on
#[derive(Default)]
pub struct RecordingTransport {
    pub events: Mutex<Vec<Recorded>>,
    fail_file_at: Option<usize>,
    file_sends: Mutex<usize>,
    next_prompt: AtomicI32,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_file_send(at: usize) -> Self {
        Self {
            fail_file_at: Some(at),
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Text(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Edit(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn captions(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::File { caption, .. } => Some(caption),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(&self, _chat: ChatId, text: &str) -> Result<(), AppError> {
        self.events.lock().unwrap().push(Recorded::Text(text.to_string()));
        Ok(())
    }

    async fn present_choices(
        &self,
        _chat: ChatId,
        _text: &str,
        choices: &[PresentedChoice],
        generation: u64,
    ) -> Result<PromptId, AppError> {
        let labels = choices
            .iter()
            .map(|c| match c {
                PresentedChoice::Format(f) => f.label.clone(),
                PresentedChoice::Auto => "Auto".to_string(),
            })
            .collect();
        self.events
            .lock()
            .unwrap()
            .push(Recorded::Prompt { labels, generation });
        Ok(MessageId(self.next_prompt.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn edit_prompt(&self, _chat: ChatId, _prompt: PromptId, text: &str) -> Result<(), AppError> {
        self.events.lock().unwrap().push(Recorded::Edit(text.to_string()));
        Ok(())
    }

    async fn send_file(&self, _chat: ChatId, path: &Path, caption: &str) -> Result<(), AppError> {
        let attempt = {
            let mut sends = self.file_sends.lock().unwrap();
            *sends += 1;
            *sends
        };
        assert!(path.exists(), "file handed to the transport must exist");

        if self.fail_file_at.is_some_and(|at| attempt >= at) {
            return Err(AppError::Download("Request Entity Too Large".to_string()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.events.lock().unwrap().push(Recorded::File {
            name,
            caption: caption.to_string(),
        });
        Ok(())
    }
}
