use thiserror::Error;

use crate::core::validation::ValidationError;

/// User-facing failure classes of one download session.
///
/// Each variant keeps an internal detail for logs. [`PipelineError::user_message`] is what
/// reaches the chat; it never includes collaborator output.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Text is not a usable URL. No session is created.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The extractor could not resolve the URL (after the fallback attempt, if any)
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
    /// Nothing playable was found
    #[error("no candidate formats")]
    NoCandidates,
    /// Source is longer than the hard ceiling
    #[error("duration {duration}s exceeds limit {limit}s")]
    DurationExceeded { duration: u64, limit: u64 },
    /// The fetch collaborator failed
    #[error("fetch failed: {0}")]
    FetchFailed(String),
    /// The segmenter failed or produced nothing
    #[error("split failed: {0}")]
    SplitFailed(String),
    /// A send failed; `delivered` parts out of `total` reached the user
    #[error("delivery failed after {delivered}/{total} parts: {detail}")]
    DeliveryFailed { delivered: usize, total: usize, detail: String },
}

impl PipelineError {
    /// Returns subcategory for logs
    pub fn subcategory(&self) -> &'static str {
        match self {
            PipelineError::InvalidInput(_) => "invalid_input",
            PipelineError::ExtractionFailed(_) => "extraction_failed",
            PipelineError::NoCandidates => "no_candidates",
            PipelineError::DurationExceeded { .. } => "duration_exceeded",
            PipelineError::FetchFailed(_) => "fetch_failed",
            PipelineError::SplitFailed(_) => "split_failed",
            PipelineError::DeliveryFailed { .. } => "delivery_failed",
        }
    }

    /// Plain-language chat message for this failure class
    pub fn user_message(&self) -> String {
        match self {
            PipelineError::InvalidInput(_) => {
                "Please send a valid URL starting with http:// or https://".to_string()
            }
            PipelineError::ExtractionFailed(_) => {
                "❌ Could not process this URL. It may be invalid or unsupported.".to_string()
            }
            PipelineError::NoCandidates => "❌ No downloadable formats were found for this URL.".to_string(),
            PipelineError::DurationExceeded { limit, .. } => {
                format!("❌ Videos longer than {} are not supported", format_limit(*limit))
            }
            PipelineError::FetchFailed(_) => "❌ Download failed. Please try again later.".to_string(),
            PipelineError::SplitFailed(_) => {
                "❌ The video is too large and could not be split into parts.".to_string()
            }
            PipelineError::DeliveryFailed { delivered: 0, total: 1, .. } => {
                "❌ Could not send the file.".to_string()
            }
            PipelineError::DeliveryFailed { delivered, total, .. } => format!(
                "❌ Sending stopped: {} of {} parts were delivered.",
                delivered, total
            ),
        }
    }
}

fn format_limit(secs: u64) -> String {
    if secs >= 3600 && secs % 3600 == 0 {
        let hours = secs / 3600;
        format!("{} hour{}", hours, if hours == 1 { "" } else { "s" })
    } else {
        format!("{} minutes", secs.div_ceil(60))
    }
}

impl From<ValidationError> for PipelineError {
    fn from(err: ValidationError) -> Self {
        PipelineError::InvalidInput(err.to_string())
    }
}
