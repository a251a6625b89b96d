use std::path::PathBuf;
use thiserror::Error;

use crate::domain::value_objects::{Platform, SessionStatus};

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Source video not found: {0}")]
    SourceNotFound(PathBuf),

    #[error("Source path is not a file: {0}")]
    SourceNotFile(PathBuf),

    #[error("Source video is not readable: {path}: {reason}")]
    SourceUnreadable { path: PathBuf, reason: String },

    #[error("At least one stream destination is required")]
    NoDestinations,

    #[error("Stream key for {0} is empty")]
    EmptyStreamKey(Platform),

    #[error("Invalid session transition: {from} -> {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },

    #[error("Failed to start {program}: {reason}")]
    SpawnFailed { program: String, reason: String },

    #[error("Transcoder I/O error: {0}")]
    ProcessIo(String),

    #[error("Invalid media file name: {0}")]
    InvalidFileName(String),

    #[error("Unsupported media file: {0} (expected .mp4 or .flv)")]
    UnsupportedMedia(String),

    #[error("Media library error at {path}: {reason}")]
    MediaIo { path: PathBuf, reason: String },
}

pub type Result<T> = std::result::Result<T, DomainError>;
