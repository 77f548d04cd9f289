use thiserror::Error;

/// Centralized infrastructure error type
///
/// Collaborators (yt-dlp, ffmpeg, Telegram, filesystem) report failures through this enum.
/// The download pipeline translates it into a user-facing
/// [`PipelineError`](crate::download::error::PipelineError) at the component boundary.
///
/// # Example
///
/// ```no_run
/// use clipferry::core::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// Download/yt-dlp errors
    #[error("Download error: {0}")]
    Download(String),

    /// ffmpeg/ffprobe errors
    #[error("Ffmpeg error: {0}")]
    Ffmpeg(String),

    /// External process exceeded its time budget
    #[error("Process timed out after {0}s")]
    Timeout(u64),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding errors (yt-dlp output)
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Helper function to convert String to AppError::Download
impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Download(err)
    }
}

/// Helper function to convert &str to AppError::Download
impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Download(err.to_string())
    }
}
