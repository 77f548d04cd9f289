//! Entry point of the chat front-end.
//!
//! `submit` turns a message into a quality prompt and arms the selection timer;
//! `select` handles a button press. Whoever wins [`SessionStore::try_resolve`] drives the
//! rest of the session.

use std::sync::Arc;
use teloxide::types::{ChatId, UserId};
use tokio::task::JoinHandle;

use crate::core::config::Limits;
use crate::core::validation::normalize_url;
use crate::download::error::PipelineError;
use crate::download::formats::{Choice, FormatCatalog};
use crate::download::pipeline::{Orchestrator, PipelineOutcome};
use crate::download::session::{Resolution, SessionStore};
use crate::download::source::{MediaExtractor, MediaSegmenter};
use crate::download::splitter::Splitter;
use crate::download::transport::ChatTransport;

pub const MANUAL_CHOICE_TEXT: &str = "⏳ Downloading with selected quality...";
pub const AUTO_CHOICE_TEXT: &str = "⏳ Selecting best quality automatically...";

/// A prompt that was shown and its armed timer
#[derive(Debug)]
pub struct Submission {
    pub generation: u64,
    /// Finishes when the timeout fired (and, if it won, when its pipeline ended)
    pub timer: JoinHandle<()>,
}

pub struct DownloadService {
    catalog: FormatCatalog,
    sessions: SessionStore,
    orchestrator: Orchestrator,
    transport: Arc<dyn ChatTransport>,
    limits: Limits,
}

impl DownloadService {
    pub fn new(
        extractor: Arc<dyn MediaExtractor>,
        segmenter: Arc<dyn MediaSegmenter>,
        transport: Arc<dyn ChatTransport>,
        limits: Limits,
    ) -> Arc<Self> {
        let splitter = Splitter::new(segmenter, limits.slice_secs);
        Arc::new(Self {
            catalog: FormatCatalog::new(Arc::clone(&extractor), limits.clone()),
            sessions: SessionStore::new(),
            orchestrator: Orchestrator::new(extractor, splitter, Arc::clone(&transport), limits.clone()),
            transport,
            limits,
        })
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    /// Handles a text message: validate, resolve formats, open a session and prompt.
    ///
    /// Returns `None` when the message ended in an error reply (no session is opened then),
    /// a newer submission of the same user took over, or the prompt could not be shown.
    pub async fn submit(self: &Arc<Self>, user: UserId, chat: ChatId, text: &str) -> Option<Submission> {
        let url = match normalize_url(text) {
            Ok(url) => url,
            Err(e) => {
                log::debug!("Rejected input from user {}: {}", user, e);
                self.reply_error(chat, &PipelineError::from(e)).await;
                return None;
            }
        };
        let generation = self.sessions.reserve(user);
        log::info!("User {} submitted {} (gen {})", user, url.as_str(), generation);

        let entry = match self.catalog.resolve(&url).await {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Resolution failed for user {} [{}]: {}", user, e.subcategory(), e);
                self.reply_error(chat, &e).await;
                return None;
            }
        };

        if !self.sessions.open(user, chat, generation, &entry) {
            return None;
        }

        if entry.long_running {
            let advisory = format!(
                "⚠️ Note: This is a long video ({}+ mins), processing may take extra time",
                self.limits.long_video_secs / 60
            );
            self.send_quietly(chat, &advisory).await;
        }

        let prompt_text = format!(
            "Choose video quality (or wait {}s for auto-select):",
            self.limits.selection_timeout.as_secs()
        );

        match self
            .transport
            .present_choices(chat, &prompt_text, &entry.presentable, generation)
            .await
        {
            Ok(prompt) => {
                self.sessions.set_prompt(user, generation, prompt);
            }
            Err(e) => {
                log::error!("Failed to present choices to {}: {}", chat, e);
                self.sessions.finish(user, generation);
                return None;
            }
        }

        let timer = self.arm_timer(user, generation);
        Some(Submission { generation, timer })
    }

    /// Handles a button press. `None` when the press lost: stale, superseded or already resolved.
    pub fn select(self: &Arc<Self>, user: UserId, generation: u64, choice: Choice) -> Option<JoinHandle<()>> {
        let resolution = self.sessions.try_resolve(user, generation, &choice)?;
        log::info!(
            "User {} picked format {} (gen {})",
            user,
            resolution.format_id,
            generation
        );

        let service = Arc::clone(self);
        Some(tokio::spawn(async move {
            service.drive(user, generation, resolution).await;
        }))
    }

    fn arm_timer(self: &Arc<Self>, user: UserId, generation: u64) -> JoinHandle<()> {
        let service = Arc::clone(self);
        let timeout = self.limits.selection_timeout;

        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            let Some(resolution) = service.sessions.try_resolve(user, generation, &Choice::Auto) else {
                log::debug!("Selection timer of user {} (gen {}) found nothing to do", user, generation);
                return;
            };
            log::info!(
                "No choice from user {} within {:?}, using {}",
                user,
                timeout,
                resolution.format_id
            );
            service.drive(user, generation, resolution).await;
        })
    }

    /// Runs the winner's side of a session through to the end.
    ///
    /// The job was fixed by `try_resolve`; a newer submission arriving now does not cancel it.
    async fn drive(&self, user: UserId, generation: u64, resolution: Resolution) {
        if !self.sessions.consume(user, generation) {
            log::debug!("Session of user {} (gen {}) superseded after resolution", user, generation);
        }

        if let Some(prompt) = resolution.prompt {
            let text = if resolution.automatic {
                AUTO_CHOICE_TEXT
            } else {
                MANUAL_CHOICE_TEXT
            };
            if let Err(e) = self.transport.edit_prompt(resolution.chat, prompt, text).await {
                log::warn!("Failed to edit prompt for user {}: {}", user, e);
            }
        }

        let job = resolution.job;
        match self.orchestrator.run(&job).await {
            PipelineOutcome::Delivered { parts } => {
                log::info!("Delivered {} part(s) of {} to user {}", parts, job.url, user);
            }
            PipelineOutcome::Failed(e) => self.reply_error(job.chat, &e).await,
        }

        self.sessions.finish(user, generation);
    }

    async fn reply_error(&self, chat: ChatId, err: &PipelineError) {
        self.send_quietly(chat, &err.user_message()).await;
    }

    async fn send_quietly(&self, chat: ChatId, text: &str) {
        if let Err(e) = self.transport.send_text(chat, text).await {
            log::warn!("Failed to send message to {}: {}", chat, e);
        }
    }
}
