use std::collections::BTreeMap;
use std::fmt;

use super::Platform;
use crate::domain::errors::{DomainError, Result};

/// Replacement text for stream keys in anything shown to users.
pub const REDACTED_KEY: &str = "****";

/// Opaque stream credential. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct StreamKey(String);

impl StreamKey {
    pub fn new(platform: Platform, key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(DomainError::EmptyStreamKey(platform));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StreamKey({})", REDACTED_KEY)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDestination {
    platform: Platform,
    key: StreamKey,
}

impl StreamDestination {
    pub fn new(platform: Platform, key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            platform,
            key: StreamKey::new(platform, key)?,
        })
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn key(&self) -> &StreamKey {
        &self.key
    }

    pub fn ingest_url(&self) -> String {
        format!("{}{}", self.platform.ingest_base(), self.key.expose())
    }
}

/// One optional slot per platform, iterated in platform order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationSet {
    slots: BTreeMap<Platform, StreamDestination>,
}

impl DestinationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from per-platform key fields, skipping blank ones.
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = (Platform, Option<S>)>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for (platform, key) in keys {
            if let Some(Ok(destination)) = key.map(|k| StreamDestination::new(platform, k)) {
                set.insert(destination);
            }
        }
        set
    }

    /// Returns the destination previously held by the same platform slot.
    pub fn insert(&mut self, destination: StreamDestination) -> Option<StreamDestination> {
        self.slots.insert(destination.platform(), destination)
    }

    pub fn remove(&mut self, platform: Platform) -> Option<StreamDestination> {
        self.slots.remove(&platform)
    }

    pub fn get(&self, platform: Platform) -> Option<&StreamDestination> {
        self.slots.get(&platform)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StreamDestination> {
        self.slots.values()
    }

    pub fn platforms(&self) -> Vec<Platform> {
        self.slots.keys().copied().collect()
    }

    /// Masks every stream key of this set found in `text`.
    ///
    /// The transcoder echoes its output target, so relayed lines can carry keys.
    pub fn redact(&self, text: &str) -> String {
        let mut keys: Vec<&str> = self.iter().map(|d| d.key().expose()).collect();
        // Longest first so a key contained in another is not half-masked
        keys.sort_by_key(|k| std::cmp::Reverse(k.len()));

        keys.into_iter()
            .fold(text.to_string(), |line, key| line.replace(key, REDACTED_KEY))
    }
}

impl FromIterator<StreamDestination> for DestinationSet {
    fn from_iter<T: IntoIterator<Item = StreamDestination>>(iter: T) -> Self {
        let mut set = Self::new();
        for destination in iter {
            set.insert(destination);
        }
        set
    }
}
