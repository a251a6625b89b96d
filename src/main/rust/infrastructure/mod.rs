pub mod ffmpeg;
pub mod listeners;
pub mod media;
pub mod metrics;
