use crate::domain::entities::SessionId;
use crate::domain::ports::SessionListener;
use crate::domain::value_objects::{LogKind, LogRecord, SessionStatus};

/// Renders session callbacks as structured log events.
pub struct TracingListener;

impl TracingListener {
    pub fn new() -> Self {
        Self
    }
}

impl Default for TracingListener {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionListener for TracingListener {
    fn on_log(&self, session_id: SessionId, record: &LogRecord) {
        match record.kind() {
            LogKind::Output | LogKind::Notice => {
                tracing::info!(session_id = %session_id, "{}", record)
            }
            LogKind::Error => tracing::error!(session_id = %session_id, "{}", record),
        }
    }

    fn on_status(&self, session_id: SessionId, status: SessionStatus) {
        tracing::info!(session_id = %session_id, status = %status, "Session status changed");
    }
}
