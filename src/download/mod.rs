//! Download sessions: format catalog, selection, fetching, splitting and delivery

pub mod error;
pub mod formats;
pub mod pipeline;
pub mod service;
pub mod session;
pub mod source;
pub mod splitter;
pub mod transport;
pub mod workspace;

// Re-exports for convenience
pub use error::PipelineError;
pub use formats::{CandidateFormat, CatalogEntry, Choice, FormatCatalog, MediaKind, PresentedChoice};
pub use pipeline::{Orchestrator, PipelineOutcome, ResolvedJob};
pub use service::DownloadService;
pub use session::{ResolutionState, SessionStore};
pub use source::{FfmpegSegmenter, MediaExtractor, MediaSegmenter, YtDlpExtractor};
pub use transport::{ChatTransport, PromptId};
