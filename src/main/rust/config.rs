use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDateTime};
use clap::Parser;

use crate::domain::value_objects::{AspectMode, DestinationSet, Platform};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "multistream-relay",
    version = "0.1.0",
    about = "Loop a local video to several live platforms at once through one ffmpeg tee output"
)]
pub struct Config {
    /// Video to stream (bare names resolve inside --media-dir)
    #[arg(short = 'i', long = "video", env = "VIDEO_PATH")]
    pub video_path: Option<PathBuf>,

    /// Directory holding candidate .mp4/.flv videos
    #[arg(long, env = "MEDIA_DIR", default_value = ".")]
    pub media_dir: PathBuf,

    /// Copy this file into --media-dir and stream it
    #[arg(long, conflicts_with = "video_path")]
    pub import: Option<PathBuf>,

    /// List the videos in --media-dir and exit
    #[arg(long)]
    pub list_videos: bool,

    /// Facebook stream key
    #[arg(long, env = "FACEBOOK_STREAM_KEY", hide_env_values = true)]
    pub facebook_key: Option<String>,

    /// YouTube stream key
    #[arg(long, env = "YOUTUBE_STREAM_KEY", hide_env_values = true)]
    pub youtube_key: Option<String>,

    /// Twitch stream key
    #[arg(long, env = "TWITCH_STREAM_KEY", hide_env_values = true)]
    pub twitch_key: Option<String>,

    /// TikTok stream key
    #[arg(long, env = "TIKTOK_STREAM_KEY", hide_env_values = true)]
    pub tiktok_key: Option<String>,

    /// Reframe to 720x1280 for vertical shorts
    #[arg(long)]
    pub shorts: bool,

    /// Local start time, e.g. "2025-03-07 19:05:00"
    #[arg(long)]
    pub start_at: Option<String>,

    /// Path to the ffmpeg binary
    #[arg(long, env = "FFMPEG_PATH", default_value = "ffmpeg")]
    pub ffmpeg_path: PathBuf,

    /// Number of recent log lines kept per session
    #[arg(long, default_value = "15")]
    pub log_lines: usize,

    /// Seconds ffmpeg gets to quit before it is killed on stop
    #[arg(long, default_value = "2")]
    pub stop_grace_secs: u64,

    /// Metrics server port
    #[arg(long, env = "METRICS_PORT", default_value = "9003")]
    pub metrics_port: u16,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Minimum allowed port (ports below 1024 are privileged)
const MIN_USER_PORT: u16 = 1024;

/// Accepted `--start-at` layouts, tried in order.
const START_AT_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d-%m-%Y %H:%M:%S"];

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        Self::validate_port(self.metrics_port, "metrics")?;

        if self.log_lines == 0 {
            anyhow::bail!("--log-lines must be at least 1");
        }

        if self.list_videos {
            return Ok(());
        }

        self.start_time()?;

        if self.destinations().is_empty() {
            anyhow::bail!(
                "At least one stream key is required (--facebook-key, --youtube-key, --twitch-key or --tiktok-key)"
            );
        }

        Ok(())
    }

    fn validate_port(port: u16, name: &str) -> anyhow::Result<()> {
        if port == 0 {
            anyhow::bail!("Invalid {} port: port cannot be 0", name);
        }
        if port < MIN_USER_PORT {
            anyhow::bail!(
                "Invalid {} port: {} is a privileged port (< {}). Use a port >= {}",
                name,
                port,
                MIN_USER_PORT,
                MIN_USER_PORT
            );
        }
        Ok(())
    }

    pub fn destinations(&self) -> DestinationSet {
        DestinationSet::from_keys([
            (Platform::Facebook, self.facebook_key.clone()),
            (Platform::YouTube, self.youtube_key.clone()),
            (Platform::Twitch, self.twitch_key.clone()),
            (Platform::TikTok, self.tiktok_key.clone()),
        ])
    }

    pub fn aspect_mode(&self) -> AspectMode {
        AspectMode::from_shorts_flag(self.shorts)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_secs(self.stop_grace_secs)
    }

    pub fn start_time(&self) -> anyhow::Result<Option<DateTime<Local>>> {
        self.start_at.as_deref().map(parse_start_at).transpose()
    }
}

pub fn parse_start_at(value: &str) -> anyhow::Result<DateTime<Local>> {
    let value = value.trim();
    let naive = START_AT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Invalid start time '{}': expected one of {}",
                value,
                START_AT_FORMATS.join(", ")
            )
        })?;

    naive
        .and_local_timezone(Local)
        .earliest()
        .ok_or_else(|| anyhow::anyhow!("Start time '{}' does not exist in the local timezone", value))
}
