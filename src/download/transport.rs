//! Delivery channel seen by the pipeline.
//!
//! The Telegram implementation lives in `telegram::transport`; tests use a recording fake.

use async_trait::async_trait;
use std::path::Path;
use teloxide::types::{ChatId, MessageId};

use crate::core::error::AppError;
use crate::download::formats::PresentedChoice;

/// Handle of the quality prompt message, used to edit it once resolved
pub type PromptId = MessageId;

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), AppError>;

    /// Shows the quality prompt. Buttons carry `generation` so stale presses can be told apart.
    async fn present_choices(
        &self,
        chat: ChatId,
        text: &str,
        choices: &[PresentedChoice],
        generation: u64,
    ) -> Result<PromptId, AppError>;

    /// Replaces the prompt text and removes its buttons
    async fn edit_prompt(&self, chat: ChatId, prompt: PromptId, text: &str) -> Result<(), AppError>;

    async fn send_file(&self, chat: ChatId, path: &Path, caption: &str) -> Result<(), AppError>;
}
