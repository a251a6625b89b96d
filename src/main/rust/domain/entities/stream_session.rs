use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::errors::{DomainError, Result};
use crate::domain::value_objects::{LogRecord, Platform, SessionStatus, StreamRequest};

/// Log lines kept per session when no capacity is configured.
pub const DEFAULT_LOG_CAPACITY: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// One transcoding attempt, from creation until the child is reaped.
#[derive(Debug, Clone)]
pub struct StreamSession {
    id: SessionId,
    request: StreamRequest,
    created_at: DateTime<Local>,
    spawned_at: Option<Instant>,
    finished_after: Option<Duration>,
    status: SessionStatus,
    pid: Option<u32>,
    exit_code: Option<i32>,
    logs: VecDeque<LogRecord>,
    log_capacity: usize,
}

impl StreamSession {
    pub fn new(request: StreamRequest, log_capacity: usize) -> Self {
        let log_capacity = log_capacity.max(1);
        Self {
            id: SessionId::new(),
            request,
            created_at: Local::now(),
            spawned_at: None,
            finished_after: None,
            status: SessionStatus::Idle,
            pid: None,
            exit_code: None,
            logs: VecDeque::with_capacity(log_capacity),
            log_capacity,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn request(&self) -> &StreamRequest {
        &self.request
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    /// Time since the transcoder was spawned; frozen once the session ends.
    pub fn elapsed(&self) -> Option<Duration> {
        self.finished_after
            .or_else(|| self.spawned_at.map(|start| start.elapsed()))
    }

    pub fn recent_logs(&self) -> impl Iterator<Item = &LogRecord> {
        self.logs.iter()
    }

    pub fn push_log(&mut self, record: LogRecord) {
        if self.logs.len() == self.log_capacity {
            self.logs.pop_front();
        }
        self.logs.push_back(record);
    }

    pub fn mark_scheduled(&mut self) -> Result<()> {
        self.transition(SessionStatus::Scheduled)
    }

    pub fn mark_live(&mut self, pid: Option<u32>, spawned_at: Instant) -> Result<()> {
        self.transition(SessionStatus::Live)?;
        self.pid = pid;
        self.spawned_at = Some(spawned_at);
        Ok(())
    }

    pub fn mark_stopped(&mut self, exit_code: Option<i32>) -> Result<()> {
        self.transition(SessionStatus::Stopped)?;
        self.exit_code = exit_code;
        self.freeze_elapsed();
        Ok(())
    }

    pub fn mark_failed(&mut self) -> Result<()> {
        self.transition(SessionStatus::Failed)?;
        self.freeze_elapsed();
        Ok(())
    }

    fn freeze_elapsed(&mut self) {
        self.finished_after = self.spawned_at.map(|start| start.elapsed());
    }

    fn transition(&mut self, next: SessionStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            status: self.status,
            source: self.request.source_path().to_path_buf(),
            platforms: self.request.destinations().platforms(),
            created_at: self.created_at,
            elapsed_secs: self.elapsed().map(|d| d.as_secs()),
            pid: self.pid,
            exit_code: self.exit_code,
            recent_logs: self.logs.iter().cloned().collect(),
        }
    }
}

/// Point-in-time view of a session, safe to hand to renderers.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub status: SessionStatus,
    pub source: PathBuf,
    pub platforms: Vec<Platform>,
    pub created_at: DateTime<Local>,
    pub elapsed_secs: Option<u64>,
    pub pid: Option<u32>,
    pub exit_code: Option<i32>,
    pub recent_logs: Vec<LogRecord>,
}
