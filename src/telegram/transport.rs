//! [`ChatTransport`] over the Telegram Bot API.

use async_trait::async_trait;
use std::path::Path;
use teloxide::prelude::*;
use teloxide::types::{ChatAction, InputFile};

use crate::core::error::AppError;
use crate::download::formats::PresentedChoice;
use crate::download::transport::{ChatTransport, PromptId};
use crate::telegram::keyboard::build_choice_keyboard;

/// How a file is uploaded, decided by its extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Video,
    Audio,
    Document,
}

impl UploadKind {
    pub fn for_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "mp4" | "mkv" | "webm" | "mov" => UploadKind::Video,
            "m4a" | "mp3" | "opus" | "ogg" | "aac" => UploadKind::Audio,
            _ => UploadKind::Document,
        }
    }

    fn chat_action(self) -> ChatAction {
        match self {
            UploadKind::Video => ChatAction::UploadVideo,
            UploadKind::Audio => ChatAction::UploadVoice,
            UploadKind::Document => ChatAction::UploadDocument,
        }
    }
}

#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), AppError> {
        self.bot.send_message(chat, text).await?;
        Ok(())
    }

    async fn present_choices(
        &self,
        chat: ChatId,
        text: &str,
        choices: &[PresentedChoice],
        generation: u64,
    ) -> Result<PromptId, AppError> {
        let message = self
            .bot
            .send_message(chat, text)
            .reply_markup(build_choice_keyboard(choices, generation))
            .await?;
        Ok(message.id)
    }

    async fn edit_prompt(&self, chat: ChatId, prompt: PromptId, text: &str) -> Result<(), AppError> {
        self.bot.edit_message_text(chat, prompt, text).await?;
        Ok(())
    }

    async fn send_file(&self, chat: ChatId, path: &Path, caption: &str) -> Result<(), AppError> {
        let kind = UploadKind::for_path(path);
        if let Err(e) = self.bot.send_chat_action(chat, kind.chat_action()).await {
            log::warn!("Failed to send chat action to {}: {}", chat, e);
        }

        let file = InputFile::file(path.to_path_buf());
        match kind {
            UploadKind::Video => {
                self.bot
                    .send_video(chat, file)
                    .caption(caption)
                    .supports_streaming(true)
                    .await?;
            }
            UploadKind::Audio => {
                self.bot.send_audio(chat, file).caption(caption).await?;
            }
            UploadKind::Document => {
                self.bot.send_document(chat, file).caption(caption).await?;
            }
        }
        log::info!("Uploaded {} to {} as {:?}", path.display(), chat, kind);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_kind_by_extension() {
        assert_eq!(UploadKind::for_path(Path::new("/tmp/a/part_000.mp4")), UploadKind::Video);
        assert_eq!(UploadKind::for_path(Path::new("clip.WEBM")), UploadKind::Video);
        assert_eq!(UploadKind::for_path(Path::new("song.m4a")), UploadKind::Audio);
        assert_eq!(UploadKind::for_path(Path::new("subs.vtt")), UploadKind::Document);
        assert_eq!(UploadKind::for_path(Path::new("noext")), UploadKind::Document);
    }
}
