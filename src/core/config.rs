use once_cell::sync::Lazy;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

// Configuration constants for the bot

/// Cached yt-dlp binary path
/// Read once at startup from YTDL_BIN environment variable or defaults to "yt-dlp"
pub static YTDL_BIN: Lazy<String> = Lazy::new(|| env::var("YTDL_BIN").unwrap_or_else(|_| "yt-dlp".to_string()));

/// ffmpeg binary path (FFMPEG_BIN, default "ffmpeg")
pub static FFMPEG_BIN: Lazy<String> =
    Lazy::new(|| env::var("FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".to_string()));

/// ffprobe binary path (FFPROBE_BIN, default "ffprobe")
pub static FFPROBE_BIN: Lazy<String> =
    Lazy::new(|| env::var("FFPROBE_BIN").unwrap_or_else(|_| "ffprobe".to_string()));

/// Path to cookies file passed to yt-dlp untouched
/// Read from YTDL_COOKIES_FILE environment variable
/// Example: youtube_cookies.txt
pub static YTDL_COOKIES_FILE: Lazy<Option<String>> = Lazy::new(|| non_empty_var("YTDL_COOKIES_FILE"));

/// User-Agent forwarded to yt-dlp for sites that fingerprint clients
pub static YTDL_USER_AGENT: Lazy<Option<String>> = Lazy::new(|| non_empty_var("YTDL_USER_AGENT"));

/// Temporary files directory for downloads and split parts
/// Read from TEMP_FILES_DIR environment variable, supports tilde (~) expansion
/// Default: /tmp/clipferry
pub static TEMP_FILES_DIR: Lazy<String> =
    Lazy::new(|| env::var("TEMP_FILES_DIR").unwrap_or_else(|_| "/tmp/clipferry".to_string()));

/// Log file path
/// Read from LOG_FILE_PATH environment variable
/// Default: clipferry.log
pub static LOG_FILE_PATH: Lazy<String> =
    Lazy::new(|| env::var("LOG_FILE_PATH").unwrap_or_else(|_| "clipferry.log".to_string()));

/// Bot token
/// Read from BOT_TOKEN or TELOXIDE_TOKEN environment variable
pub static BOT_TOKEN: Lazy<String> = Lazy::new(|| {
    env::var("BOT_TOKEN")
        .or_else(|_| env::var("TELOXIDE_TOKEN"))
        .unwrap_or_else(|_| String::new())
});

/// Process-wide limits, read once from the environment
pub static LIMITS: Lazy<Limits> = Lazy::new(Limits::from_env);

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Tunable limits of the download pipeline.
///
/// Every field can be overridden through the environment (see [`Limits::from_env`]).
/// Tests build their own instance instead of touching the process environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Limits {
    /// Largest file the chat transport accepts in one send
    pub max_file_size_bytes: u64,
    /// Durations above this get an advisory before the prompt
    pub long_video_secs: u64,
    /// Durations above this are rejected outright
    pub max_duration_secs: u64,
    /// How long the quality prompt waits before picking automatically
    pub selection_timeout: Duration,
    /// Length of one time slice when splitting
    pub slice_secs: u64,
    /// Formats larger than this are not offered as buttons
    pub choice_size_ceiling_bytes: u64,
    /// Highest resolution the automatic pick may choose
    pub quality_cap: u32,
    /// Root of the per-run working directories
    pub temp_root: PathBuf,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_size_bytes: validation::MAX_FILE_SIZE_BYTES,
            long_video_secs: 30 * 60,
            max_duration_secs: 2 * 60 * 60,
            selection_timeout: Duration::from_secs(30),
            slice_secs: 240,
            choice_size_ceiling_bytes: 500 * 1024 * 1024,
            quality_cap: 1080,
            temp_root: std::env::temp_dir().join("clipferry"),
        }
    }
}

impl Limits {
    /// Reads the limits from environment variables, falling back to defaults.
    ///
    /// - `MAX_FILE_SIZE_MB` (50)
    /// - `LONG_VIDEO_SECS` (1800)
    /// - `MAX_DURATION_SECS` (7200)
    /// - `SELECTION_TIMEOUT_SECS` (30)
    /// - `SLICE_SECS` (240)
    /// - `CHOICE_SIZE_CEILING_MB` (500)
    /// - `QUALITY_CAP` (1080)
    /// - `TEMP_FILES_DIR` (/tmp/clipferry)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_file_size_bytes: parse_var::<u64>("MAX_FILE_SIZE_MB")
                .map(|mb| mb.saturating_mul(1024 * 1024))
                .unwrap_or(defaults.max_file_size_bytes),
            long_video_secs: parse_var("LONG_VIDEO_SECS").unwrap_or(defaults.long_video_secs),
            max_duration_secs: parse_var("MAX_DURATION_SECS").unwrap_or(defaults.max_duration_secs),
            selection_timeout: parse_var::<u64>("SELECTION_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.selection_timeout),
            slice_secs: parse_var::<u64>("SLICE_SECS")
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.slice_secs),
            choice_size_ceiling_bytes: parse_var::<u64>("CHOICE_SIZE_CEILING_MB")
                .map(|mb| mb.saturating_mul(1024 * 1024))
                .unwrap_or(defaults.choice_size_ceiling_bytes),
            quality_cap: parse_var("QUALITY_CAP").unwrap_or(defaults.quality_cap),
            temp_root: PathBuf::from(shellexpand::tilde(TEMP_FILES_DIR.as_str()).to_string()),
        }
    }
}

/// Download configuration
pub mod download {
    use super::Duration;

    /// Timeout for yt-dlp metadata commands (in seconds)
    pub const YTDLP_RESOLVE_TIMEOUT_SECS: u64 = 120;

    /// Timeout for the yt-dlp download itself (in seconds)
    pub const YTDLP_FETCH_TIMEOUT_SECS: u64 = 30 * 60;

    /// Titles longer than this are cut for captions
    pub const MAX_TITLE_CHARS: usize = 100;

    pub fn resolve_timeout() -> Duration {
        Duration::from_secs(YTDLP_RESOLVE_TIMEOUT_SECS)
    }

    pub fn fetch_timeout() -> Duration {
        Duration::from_secs(YTDLP_FETCH_TIMEOUT_SECS)
    }
}

/// Network configuration
pub mod network {
    use super::Duration;

    /// Request timeout for HTTP requests (in seconds)
    /// Long enough for 50 MB uploads on slow links
    pub const REQUEST_TIMEOUT_SECS: u64 = 900; // 15 minutes

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// Validation configuration
pub mod validation {
    /// Maximum URL length (RFC 7230 recommends 8000, but we use 2048 for safety)
    pub const MAX_URL_LENGTH: usize = 2048;

    /// Maximum file size for Telegram (50MB in bytes)
    /// Telegram Bot API allows up to 50MB for files
    pub const MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024; // 50 MB
}

/// Bot API server configuration utilities
pub mod bot_api {
    /// Returns the BOT_API_URL environment variable if set.
    pub fn get_url() -> Option<String> {
        std::env::var("BOT_API_URL").ok()
    }

    /// Checks if the given URL string points to a local Bot API server.
    pub fn is_local_url(url: &str) -> bool {
        !url.contains("api.telegram.org")
    }
}
