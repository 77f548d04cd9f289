//! Cuts an oversized download into time slices the chat transport accepts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::download::error::PipelineError;
use crate::download::source::MediaSegmenter;

/// Name of the directory, next to the source file, that receives the slices
pub const CHUNKS_DIR: &str = "chunks";

/// One deliverable slice. `index` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub index: usize,
    pub path: PathBuf,
    pub size: u64,
}

pub struct Splitter {
    segmenter: Arc<dyn MediaSegmenter>,
    slice_secs: u64,
}

impl Splitter {
    pub fn new(segmenter: Arc<dyn MediaSegmenter>, slice_secs: u64) -> Self {
        Self {
            segmenter,
            slice_secs: slice_secs.max(1),
        }
    }

    /// Splits `path` into ordered parts inside a `chunks` directory beside it.
    ///
    /// Parts are numbered in time order. Any collaborator failure, a non-positive
    /// duration or an empty result is [`PipelineError::SplitFailed`].
    pub async fn split(&self, path: &Path, ceiling: u64) -> Result<Vec<Part>, PipelineError> {
        let duration = self
            .segmenter
            .probe(path)
            .await
            .map_err(|e| PipelineError::SplitFailed(format!("probe: {}", e)))?;
        if !(duration.is_finite() && duration > 0.0) {
            return Err(PipelineError::SplitFailed(format!("bad duration {}", duration)));
        }

        let expected = (duration / self.slice_secs as f64).ceil() as u64;
        log::info!(
            "Splitting {} ({:.1}s) into ~{} parts of {}s",
            path.display(),
            duration,
            expected,
            self.slice_secs
        );

        let out_dir = path
            .parent()
            .map(|dir| dir.join(CHUNKS_DIR))
            .ok_or_else(|| PipelineError::SplitFailed(format!("no parent dir for {}", path.display())))?;
        fs_err::tokio::create_dir_all(&out_dir)
            .await
            .map_err(|e| PipelineError::SplitFailed(e.to_string()))?;

        let mut files = self
            .segmenter
            .segment(path, self.slice_secs, &out_dir)
            .await
            .map_err(|e| PipelineError::SplitFailed(e.to_string()))?;
        files.sort();

        if files.is_empty() {
            return Err(PipelineError::SplitFailed("segmenter produced no parts".to_string()));
        }

        let mut parts = Vec::with_capacity(files.len());
        for (i, file) in files.into_iter().enumerate() {
            let size = fs_err::tokio::metadata(&file)
                .await
                .map_err(|e| PipelineError::SplitFailed(e.to_string()))?
                .len();
            if size > ceiling {
                log::warn!(
                    "Part {} is {} bytes, above the {} byte ceiling",
                    i + 1,
                    size,
                    ceiling
                );
            }
            parts.push(Part {
                index: i + 1,
                path: file,
                size,
            });
        }

        if parts.len() as u64 != expected {
            log::debug!("Expected {} parts, got {}", expected, parts.len());
        }

        Ok(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::AppError;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    /// Writes `count` slices named in reverse creation order
    struct FakeSegmenter {
        duration: Result<f64, String>,
        count: usize,
    }

    #[async_trait]
    impl MediaSegmenter for FakeSegmenter {
        async fn probe(&self, _path: &Path) -> Result<f64, AppError> {
            self.duration.clone().map_err(AppError::Ffmpeg)
        }

        async fn segment(&self, _path: &Path, _slice_secs: u64, out_dir: &Path) -> Result<Vec<PathBuf>, AppError> {
            let mut files = Vec::new();
            for i in (0..self.count).rev() {
                let file = out_dir.join(format!("part_{:03}.mp4", i));
                std::fs::write(&file, vec![0u8; 10 + i])?;
                files.push(file);
            }
            Ok(files)
        }
    }

    fn source(dir: &Path) -> PathBuf {
        let path = dir.join("video.mp4");
        std::fs::write(&path, b"source").unwrap();
        path
    }

    #[tokio::test]
    async fn test_parts_are_ordered_and_sized() {
        let dir = tempfile::tempdir().unwrap();
        let splitter = Splitter::new(
            Arc::new(FakeSegmenter {
                duration: Ok(900.0),
                count: 4,
            }),
            240,
        );

        let parts = splitter.split(&source(dir.path()), 1024).await.unwrap();
        let indexes: Vec<usize> = parts.iter().map(|p| p.index).collect();
        assert_eq!(indexes, vec![1, 2, 3, 4]);
        assert!(parts[0].path.ends_with("chunks/part_000.mp4"));
        assert_eq!(parts[3].size, 13);
    }

    #[tokio::test]
    async fn test_probe_failure_is_split_failed() {
        let dir = tempfile::tempdir().unwrap();
        let splitter = Splitter::new(
            Arc::new(FakeSegmenter {
                duration: Err("moov atom not found".to_string()),
                count: 4,
            }),
            240,
        );
        let err = splitter.split(&source(dir.path()), 1024).await.unwrap_err();
        assert!(matches!(err, PipelineError::SplitFailed(_)));
    }

    #[tokio::test]
    async fn test_zero_duration_is_split_failed() {
        let dir = tempfile::tempdir().unwrap();
        let splitter = Splitter::new(
            Arc::new(FakeSegmenter {
                duration: Ok(0.0),
                count: 1,
            }),
            240,
        );
        assert!(splitter.split(&source(dir.path()), 1024).await.is_err());
    }

    #[tokio::test]
    async fn test_no_output_is_split_failed() {
        let dir = tempfile::tempdir().unwrap();
        let splitter = Splitter::new(
            Arc::new(FakeSegmenter {
                duration: Ok(300.0),
                count: 0,
            }),
            240,
        );
        let err = splitter.split(&source(dir.path()), 1024).await.unwrap_err();
        assert_eq!(
            err,
            PipelineError::SplitFailed("segmenter produced no parts".to_string())
        );
    }
}
