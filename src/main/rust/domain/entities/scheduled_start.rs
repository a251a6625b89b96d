use std::time::Duration;

use chrono::{DateTime, Local};

use crate::domain::value_objects::StreamRequest;

/// Display format used when announcing a scheduled start.
pub const SCHEDULE_DISPLAY_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

/// Deferred trigger that turns into a session once its time is reached.
#[derive(Debug, Clone)]
pub struct ScheduledStart {
    start_at: DateTime<Local>,
    request: StreamRequest,
}

impl ScheduledStart {
    pub fn new(start_at: DateTime<Local>, request: StreamRequest) -> Self {
        Self { start_at, request }
    }

    pub fn start_at(&self) -> DateTime<Local> {
        self.start_at
    }

    pub fn request(&self) -> &StreamRequest {
        &self.request
    }

    pub fn into_request(self) -> StreamRequest {
        self.request
    }

    /// Remaining wait, or `None` when the start time is now or already past.
    pub fn delay_from(&self, now: DateTime<Local>) -> Option<Duration> {
        (self.start_at - now)
            .to_std()
            .ok()
            .filter(|delay| !delay.is_zero())
    }

    pub fn display_time(&self) -> String {
        self.start_at.format(SCHEDULE_DISPLAY_FORMAT).to_string()
    }
}
