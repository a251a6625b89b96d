use std::fs::File;
use std::path::{Path, PathBuf};

use super::{AspectMode, DestinationSet};
use crate::domain::errors::{DomainError, Result};

/// A validated request to go live. Construction fails unless the source is a
/// readable file and at least one destination is present.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamRequest {
    source_path: PathBuf,
    destinations: DestinationSet,
    aspect: AspectMode,
}

impl StreamRequest {
    pub fn new(source_path: PathBuf, destinations: DestinationSet) -> Result<Self> {
        Self::validate_source(&source_path)?;

        if destinations.is_empty() {
            return Err(DomainError::NoDestinations);
        }

        Ok(Self {
            source_path,
            destinations,
            aspect: AspectMode::default(),
        })
    }

    pub fn with_aspect(mut self, aspect: AspectMode) -> Self {
        self.aspect = aspect;
        self
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn destinations(&self) -> &DestinationSet {
        &self.destinations
    }

    pub fn aspect(&self) -> AspectMode {
        self.aspect
    }

    fn validate_source(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(DomainError::SourceNotFound(path.to_path_buf()));
        }

        if !path.is_file() {
            return Err(DomainError::SourceNotFile(path.to_path_buf()));
        }

        File::open(path).map_err(|e| DomainError::SourceUnreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(())
    }
}
