//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - A banner with the external tool configuration

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

/// Logs which collaborator binaries and limits are in effect
pub fn log_tool_configuration() {
    let limits = &*config::LIMITS;

    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("🔧 Tool configuration");
    log::info!("   yt-dlp:  {}", *config::YTDL_BIN);
    log::info!("   ffmpeg:  {}", *config::FFMPEG_BIN);
    log::info!("   ffprobe: {}", *config::FFPROBE_BIN);
    match config::YTDL_COOKIES_FILE.as_deref() {
        Some(path) if std::path::Path::new(path).exists() => log::info!("✅ YTDL_COOKIES_FILE: {}", path),
        Some(path) => log::warn!("⚠️  YTDL_COOKIES_FILE: {} (FILE NOT FOUND)", path),
        None => log::info!("   YTDL_COOKIES_FILE: not set"),
    }
    log::info!(
        "   limits: file {} MB, slice {}s, prompt {}s, max duration {}s",
        limits.max_file_size_bytes / 1024 / 1024,
        limits.slice_secs,
        limits.selection_timeout.as_secs(),
        limits.max_duration_secs
    );
    log::info!("   temp dir: {}", limits.temp_root.display());
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}
