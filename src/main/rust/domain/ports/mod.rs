mod metrics_reporter;
mod process_launcher;
mod session_listener;

pub use metrics_reporter::MetricsReporter;
pub use process_launcher::{ChildProcess, ProcessLauncher};
pub use session_listener::SessionListener;
