//! Bot initialization utilities
//!
//! This module contains:
//! - Command enum definition
//! - Bot instance creation
//! - Command registration in the Telegram UI

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::core::config;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Supported commands:")]
pub enum Command {
    #[command(description = "show the welcome message")]
    Start,
    #[command(description = "how to use the bot")]
    Help,
}

/// Welcome text for /start and /help
pub fn welcome_text() -> String {
    let limits = &*config::LIMITS;
    format!(
        "🎬 Video Downloader Bot 🎬\n\n\
         Send me a video link from:\n\
         - YouTube, Twitter, Instagram, etc.\n\n\
         I'll automatically choose the best quality if you don't select one within {} seconds.\n\n\
         ⚠️ Note:\n\
         - Videos longer than {} minutes are not supported\n\
         - Large videos arrive in several parts\n\
         - Some sites block downloads",
        limits.selection_timeout.as_secs(),
        limits.max_duration_secs / 60
    )
}

/// Creates a Bot instance with custom or default API URL
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(anyhow::Error)` - Missing token, invalid BOT_API_URL or HTTP client failure
pub fn create_bot() -> anyhow::Result<Bot> {
    let token = config::BOT_TOKEN.as_str();
    if token.is_empty() {
        anyhow::bail!("BOT_TOKEN (or TELOXIDE_TOKEN) is not set");
    }

    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    let bot = Bot::with_client(token, client);

    // Check if local Bot API server is configured
    let bot = match config::bot_api::get_url() {
        Some(bot_api_url) => {
            let url = url::Url::parse(&bot_api_url).map_err(|e| anyhow::anyhow!("Invalid BOT_API_URL: {}", e))?;
            if config::bot_api::is_local_url(&bot_api_url) {
                log::info!("Using local Bot API server: {}", bot_api_url);
            } else {
                log::info!("Using custom Bot API URL: {}", bot_api_url);
            }
            bot.set_api_url(url)
        }
        None => bot,
    };

    Ok(bot)
}

/// Sets up bot commands in Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}
