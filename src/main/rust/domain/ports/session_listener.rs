use crate::domain::entities::SessionId;
use crate::domain::value_objects::{LogRecord, SessionStatus};

/// Port for the caller-supplied log and status sinks.
///
/// Both methods are invoked from the session's worker task, in emission order.
pub trait SessionListener: Send + Sync {
    fn on_log(&self, session_id: SessionId, record: &LogRecord);
    fn on_status(&self, session_id: SessionId, status: SessionStatus);
}
