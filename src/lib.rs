//! Clipferry - Telegram bot that turns a media URL into delivered files
//!
//! The user sends a link, picks a quality from a short list (or lets the bot pick after
//! a timeout), and receives the file, split into parts when it is too large to send whole.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging, process helpers and URL normalization
//! - `download`: format catalog, sessions, the download pipeline and its collaborators
//! - `telegram`: bot setup, dispatcher schema and the Telegram delivery channel
//! - `cli`: command line interface of the binary

pub mod cli;
pub mod core;
pub mod download;
pub mod telegram;

// Re-export commonly used types for convenience
pub use crate::core::{config, AppError};
pub use download::{DownloadService, PipelineError};
