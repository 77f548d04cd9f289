//! Common test utilities
//!
//! Shared across the integration tests: fake collaborators and a recording chat transport.

pub mod fakes;

#[allow(unused_imports)]
pub use fakes::{
    sample_info, test_limits, video_format, workspace_is_clean, FakeExtractor, FakeSegmenter, Recorded,
    RecordingTransport, MB,
};
