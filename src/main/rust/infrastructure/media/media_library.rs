use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::errors::{DomainError, Result};

/// Extensions offered for streaming.
pub const VIDEO_EXTENSIONS: [&str; 2] = ["mp4", "flv"];

/// Directory of candidate source videos.
pub struct MediaLibrary {
    root: PathBuf,
}

impl MediaLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_video(path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| {
                VIDEO_EXTENSIONS
                    .iter()
                    .any(|known| ext.eq_ignore_ascii_case(known))
            })
            .unwrap_or(false)
    }

    /// Video files directly inside the root, sorted by file name.
    pub fn list_videos(&self) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.root).map_err(|e| self.io_error(&self.root, e))?;

        let mut videos = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| self.io_error(&self.root, e))?;
            let path = entry.path();
            if path.is_file() && Self::is_video(&path) {
                videos.push(path);
            }
        }

        videos.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(videos)
    }

    /// Store an uploaded video verbatim under its original name.
    pub fn import(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let name = Path::new(file_name);
        let is_plain_name = name.file_name().map(|n| n == name.as_os_str()).unwrap_or(false);
        if !is_plain_name {
            return Err(DomainError::InvalidFileName(file_name.to_string()));
        }

        if !Self::is_video(name) {
            return Err(DomainError::UnsupportedMedia(file_name.to_string()));
        }

        let target = self.root.join(name);
        fs::write(&target, bytes).map_err(|e| self.io_error(&target, e))?;

        tracing::info!(path = %target.display(), bytes = bytes.len(), "Imported video");
        Ok(target)
    }

    /// Paths that exist are used as given; bare names resolve inside the root.
    pub fn resolve(&self, name: &Path) -> PathBuf {
        if name.is_absolute() || name.exists() {
            name.to_path_buf()
        } else {
            self.root.join(name)
        }
    }

    fn io_error(&self, path: &Path, e: std::io::Error) -> DomainError {
        DomainError::MediaIo {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    }
}
