//! Download orchestrator: fetch, measure, split when needed, deliver, clean up.
//!
//! One [`Orchestrator::run`] call handles exactly one resolved job. Every file it creates
//! lives in a [`RunWorkspace`] that is removed before `run` returns, whatever the outcome.

use std::path::PathBuf;
use std::sync::Arc;
use teloxide::types::{ChatId, UserId};
use url::Url;

use crate::core::config::Limits;
use crate::download::error::PipelineError;
use crate::download::source::MediaExtractor;
use crate::download::splitter::{Part, Splitter};
use crate::download::transport::ChatTransport;
use crate::download::workspace::RunWorkspace;

pub const SPLIT_NOTICE: &str = "✂️ Video is too large - splitting into parts...";
pub const ALL_PARTS_SENT: &str = "✅ All parts sent successfully!";

/// A session whose choice has been fixed and consumed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedJob {
    pub user: UserId,
    pub chat: ChatId,
    pub generation: u64,
    pub url: Url,
    pub title: String,
    pub duration_secs: u64,
    pub format_id: String,
}

/// The fetched artifact, owned by one run
#[derive(Debug, Clone)]
pub struct DownloadResult {
    pub path: PathBuf,
    pub size: u64,
    pub duration_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Delivered { parts: usize },
    Failed(PipelineError),
}

pub struct Orchestrator {
    extractor: Arc<dyn MediaExtractor>,
    splitter: Splitter,
    transport: Arc<dyn ChatTransport>,
    limits: Limits,
}

impl Orchestrator {
    pub fn new(
        extractor: Arc<dyn MediaExtractor>,
        splitter: Splitter,
        transport: Arc<dyn ChatTransport>,
        limits: Limits,
    ) -> Self {
        Self {
            extractor,
            splitter,
            transport,
            limits,
        }
    }

    pub async fn run(&self, job: &ResolvedJob) -> PipelineOutcome {
        let workspace = match RunWorkspace::create(&self.limits.temp_root, job.user, job.generation).await {
            Ok(workspace) => workspace,
            Err(e) => {
                log::error!("Cannot create workspace for user {}: {}", job.user, e);
                return PipelineOutcome::Failed(PipelineError::FetchFailed(e.to_string()));
            }
        };

        let outcome = match self.run_in(&workspace, job).await {
            Ok(parts) => PipelineOutcome::Delivered { parts },
            Err(e) => {
                log::warn!(
                    "Pipeline for user {} (gen {}) failed [{}]: {}",
                    job.user,
                    job.generation,
                    e.subcategory(),
                    e
                );
                PipelineOutcome::Failed(e)
            }
        };

        workspace.close().await;
        outcome
    }

    async fn run_in(&self, workspace: &RunWorkspace, job: &ResolvedJob) -> Result<usize, PipelineError> {
        let download = self.fetch(workspace, job).await?;
        let ceiling = self.limits.max_file_size_bytes;

        if download.size <= ceiling {
            let caption = format!("🎥 {}", job.title);
            let sent = self.transport.send_file(job.chat, &download.path, &caption).await;
            remove_quietly(&download.path).await;
            return match sent {
                Ok(()) => Ok(1),
                Err(e) => Err(PipelineError::DeliveryFailed {
                    delivered: 0,
                    total: 1,
                    detail: e.to_string(),
                }),
            };
        }

        log::info!(
            "{} is {} bytes, {}s (ceiling {}), splitting",
            download.path.display(),
            download.size,
            download.duration_secs,
            ceiling
        );
        self.notify(job.chat, SPLIT_NOTICE).await;

        let parts = self.splitter.split(&download.path, ceiling).await?;
        remove_quietly(&download.path).await;

        let total = self.deliver_parts(job, &parts).await?;
        self.notify(job.chat, ALL_PARTS_SENT).await;
        Ok(total)
    }

    async fn fetch(&self, workspace: &RunWorkspace, job: &ResolvedJob) -> Result<DownloadResult, PipelineError> {
        let path = self
            .extractor
            .fetch(&job.url, &job.format_id, workspace.path())
            .await
            .map_err(|e| PipelineError::FetchFailed(e.to_string()))?;

        let size = fs_err::tokio::metadata(&path)
            .await
            .map_err(|e| PipelineError::FetchFailed(e.to_string()))?
            .len();

        log::info!(
            "Fetched {} (format {}) for user {}: {} bytes",
            job.url,
            job.format_id,
            job.user,
            size
        );

        Ok(DownloadResult {
            path,
            size,
            duration_secs: job.duration_secs,
        })
    }

    /// Sends parts in index order, stopping at the first failed send.
    async fn deliver_parts(&self, job: &ResolvedJob, parts: &[Part]) -> Result<usize, PipelineError> {
        let total = parts.len();
        let mut delivered = 0;

        for part in parts {
            let caption = format!("🎥 {} (Part {}/{})", job.title, part.index, total);
            let sent = self.transport.send_file(job.chat, &part.path, &caption).await;
            remove_quietly(&part.path).await;

            if let Err(e) = sent {
                return Err(PipelineError::DeliveryFailed {
                    delivered,
                    total,
                    detail: format!("part {}: {}", part.index, e),
                });
            }
            delivered = part.index;
            log::debug!("Sent part {}/{} ({} bytes)", part.index, total, part.size);
        }

        Ok(total)
    }

    async fn notify(&self, chat: ChatId, text: &str) {
        if let Err(e) = self.transport.send_text(chat, text).await {
            log::warn!("Failed to send notice to {}: {}", chat, e);
        }
    }
}

async fn remove_quietly(path: &std::path::Path) {
    if let Err(e) = fs_err::tokio::remove_file(path).await {
        log::debug!("Could not remove {}: {}", path.display(), e);
    }
}
