mod scheduled_start;
mod stream_session;

pub use scheduled_start::{ScheduledStart, SCHEDULE_DISPLAY_FORMAT};
pub use stream_session::{SessionId, SessionSnapshot, StreamSession, DEFAULT_LOG_CAPACITY};
