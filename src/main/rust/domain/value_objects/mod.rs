mod aspect_mode;
mod invocation;
mod log_record;
mod platform;
mod session_status;
mod stream_destination;
mod stream_request;

pub use aspect_mode::AspectMode;
pub use invocation::Invocation;
pub use log_record::{LogKind, LogRecord};
pub use platform::Platform;
pub use session_status::SessionStatus;
pub use stream_destination::{DestinationSet, StreamDestination, StreamKey, REDACTED_KEY};
pub use stream_request::StreamRequest;
