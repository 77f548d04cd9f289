use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "clipferry")]
#[command(author, version, about = "Telegram bot that downloads media by URL and delivers it in parts when needed", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot with long polling (default)
    Run,

    /// Print the versions of yt-dlp, ffmpeg and ffprobe and exit
    CheckTools,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
