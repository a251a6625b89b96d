use std::fmt;

use serde::Serialize;

/// Lifecycle states of a stream session (pure domain)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    /// Created, nothing spawned yet
    #[default]
    Idle,
    /// Waiting for a deferred start time
    Scheduled,
    /// Transcoder spawned and running
    Live,
    /// Transcoder exited or was cancelled
    Stopped,
    /// Spawn or output read failed
    Failed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "IDLE"),
            Self::Scheduled => write!(f, "SCHEDULED"),
            Self::Live => write!(f, "LIVE"),
            Self::Stopped => write!(f, "STOPPED"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

impl SessionStatus {
    /// Convert state to numeric value for metrics
    pub fn as_metric(&self) -> f64 {
        match self {
            Self::Idle => 0.0,
            Self::Scheduled => 1.0,
            Self::Live => 2.0,
            Self::Stopped => 3.0,
            Self::Failed => 4.0,
        }
    }

    /// Stopped and Failed are the "offline" states; nothing follows them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Stopped | Self::Failed)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Live)
    }

    pub fn can_transition_to(&self, next: SessionStatus) -> bool {
        use SessionStatus::*;
        matches!(
            (self, next),
            (Idle, Scheduled | Live | Stopped | Failed)
                | (Scheduled, Live | Stopped | Failed)
                | (Live, Stopped | Failed)
        )
    }
}
