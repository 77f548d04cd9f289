use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::update_listeners::Polling;

use clipferry::cli::{Cli, Commands};
use clipferry::core::process::tool_version;
use clipferry::core::{config, init_logger, log_tool_configuration};
use clipferry::download::{DownloadService, FfmpegSegmenter, YtDlpExtractor};
use clipferry::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps, TelegramTransport};

/// Main entry point
///
/// # Errors
/// Returns an error if initialization fails (logging, bot creation).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env before any config static is read
    let _ = dotenv();

    match cli.command {
        Some(Commands::CheckTools) => check_tools().await,
        Some(Commands::Run) | None => {
            init_logger(&config::LOG_FILE_PATH)?;
            run_bot().await
        }
    }
}

async fn check_tools() -> Result<()> {
    let tools = [
        (config::YTDL_BIN.as_str(), "--version"),
        (config::FFMPEG_BIN.as_str(), "-version"),
        (config::FFPROBE_BIN.as_str(), "-version"),
    ];

    let mut missing = 0;
    for (bin, arg) in tools {
        match tool_version(bin, arg).await {
            Some(version) => println!("✅ {}: {}", bin, version),
            None => {
                println!("❌ {}: not found or not runnable", bin);
                missing += 1;
            }
        }
    }

    if missing > 0 {
        anyhow::bail!("{} tool(s) unavailable", missing);
    }
    Ok(())
}

async fn run_bot() -> Result<()> {
    log::info!("Starting clipferry v{}", env!("CARGO_PKG_VERSION"));
    log_tool_configuration();

    let limits = config::LIMITS.clone();
    fs_err::tokio::create_dir_all(&limits.temp_root).await?;

    let bot = create_bot()?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let service = DownloadService::new(
        Arc::new(YtDlpExtractor::new()),
        Arc::new(FfmpegSegmenter::new()),
        Arc::new(TelegramTransport::new(bot.clone())),
        limits,
    );

    let handler = schema(HandlerDeps::new(service));
    let listener = Polling::builder(bot.clone()).drop_pending_updates().build();

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    log::info!("Dispatcher shutdown gracefully");
    Ok(())
}
